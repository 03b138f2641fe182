//! The `credtrack terms` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use credtrack_core::model::{AcademicYearId, StudentId};

use super::open_session;
use crate::{OutputFormat, SourceArgs};

pub async fn execute(
    student: StudentId,
    year: AcademicYearId,
    format: OutputFormat,
    source: SourceArgs,
) -> Result<()> {
    let session = open_session(&source, None)?;
    let breakdown = session.engine.term_credits(student, year).await?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
        return Ok(());
    }

    println!("Student {student}, academic year {year}");
    let mut table = Table::new();
    table.set_header(vec!["Term", "Subjects", "Portfolio", "Attendance", "Total"]);
    for (term, credits) in breakdown.iter() {
        table.add_row(vec![
            Cell::new(term),
            Cell::new(credits.subjects),
            Cell::new(credits.portfolio),
            Cell::new(credits.attendance),
            Cell::new(credits.total),
        ]);
    }
    println!("{table}");
    println!("All terms: {}", breakdown.grand_total());

    Ok(())
}
