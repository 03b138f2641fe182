//! The `credtrack student` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use credtrack_core::model::{AcademicYearId, StudentId};
use credtrack_core::results::CreditSummary;

use super::open_session;
use crate::{OutputFormat, SourceArgs};

pub async fn execute(
    student: StudentId,
    year: AcademicYearId,
    format: OutputFormat,
    source: SourceArgs,
) -> Result<()> {
    let session = open_session(&source, None)?;
    let summary = session.engine.student_credits(student, year).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(student, year, &summary),
    }

    Ok(())
}

fn print_summary(student: StudentId, year: AcademicYearId, summary: &CreditSummary) {
    println!("Student {student}, academic year {year}");

    let mut table = Table::new();
    table.set_header(vec!["Category", "Earned", "Maximum"]);
    let (earned, max) = (&summary.credits, &summary.maximums);
    for (label, e, m) in [
        ("Subjects", earned.subjects, max.subjects),
        ("Work experience", earned.work_experience, max.work_experience),
        ("Portfolio", earned.portfolio, max.portfolio),
        ("Attendance", earned.attendance, max.attendance),
        ("Total", earned.total, max.total),
    ] {
        table.add_row(vec![Cell::new(label), Cell::new(e), Cell::new(m)]);
    }
    println!("{table}");

    if !summary.exemptions.is_empty() {
        let ids: Vec<String> = summary.exemptions.iter().map(|id| id.to_string()).collect();
        println!("Exempt subjects: {}", ids.join(", "));
    }

    let grade = summary.grade_descriptor;
    println!("Percentage: {:.1}%", summary.percentage);
    println!("Grade: {grade}");
    println!("  {}", grade.description());
    println!("  {}", grade.recommendation());
}
