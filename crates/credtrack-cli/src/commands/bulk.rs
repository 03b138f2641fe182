//! The `credtrack bulk` command.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;

use credtrack_core::engine::BatchReporter;
use credtrack_core::model::{AcademicYearId, StudentId};
use credtrack_core::report::BatchReport;
use credtrack_core::results::{CreditSummary, StudentOutcome};

use super::open_session;
use crate::{OutputFormat, SourceArgs};

/// Console progress reporter.
struct ConsoleReporter;

impl BatchReporter for ConsoleReporter {
    fn on_student_start(&self, student: StudentId, batch: usize) {
        tracing::debug!(%student, batch, "student started");
    }

    fn on_student_complete(&self, student: StudentId, summary: &CreditSummary) {
        eprintln!(
            "  Done: student {student} {}/{} ({:.1}%)",
            summary.credits.total, summary.maximums.total, summary.percentage
        );
    }

    fn on_student_error(&self, student: StudentId, error: &str) {
        eprintln!("  ERROR: student {student}: {error}");
    }

    fn on_batch_complete(&self, batch: usize, succeeded: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "Batch {}: {succeeded} succeeded, {failed} failed ({:.1}s)",
            batch + 1,
            elapsed.as_secs_f64()
        );
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    students: Vec<StudentId>,
    all: bool,
    year: AcademicYearId,
    batch_size: Option<usize>,
    output: Option<PathBuf>,
    format: OutputFormat,
    fail_on_error: bool,
    source: SourceArgs,
) -> Result<()> {
    let session = open_session(&source, batch_size)?;

    let students = if all {
        match &session.known_students {
            Some(known) => known.clone(),
            None => anyhow::bail!("--all needs a fixture-backed store; pass --students instead"),
        }
    } else {
        students
    };

    eprintln!(
        "credtrack v{} -- {} students in batches of {}",
        env!("CARGO_PKG_VERSION"),
        students.len(),
        session.config.batch_size
    );

    let start = Instant::now();
    let results = session
        .engine
        .bulk_student_credits_with(&students, year, &ConsoleReporter)
        .await;
    let report = BatchReport::new(year, results, start.elapsed().as_millis() as u64);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report.results)?),
        OutputFormat::Text => print_summary(&report),
    }

    if let Some(dir) = output.or_else(|| session.config.output_dir.clone()) {
        let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
        let path = dir.join(format!("credits-{timestamp}.json"));
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    if fail_on_error && report.summary.failed > 0 {
        anyhow::bail!("{} student(s) failed", report.summary.failed);
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Student", "Earned", "Maximum", "Percentage", "Grade"]);

    for (student, outcome) in &report.results {
        match outcome {
            StudentOutcome::Summary(summary) => table.add_row(vec![
                Cell::new(student),
                Cell::new(summary.credits.total),
                Cell::new(summary.maximums.total),
                Cell::new(format!("{:.1}%", summary.percentage)),
                Cell::new(summary.grade_descriptor),
            ]),
            StudentOutcome::Failed { error } => table.add_row(vec![
                Cell::new(student),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(format!("error: {error}")),
            ]),
        };
    }
    println!("{table}");

    let summary = &report.summary;
    let mean = summary
        .mean_percentage
        .map(|p| format!("{p:.1}%"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "{} requested, {} succeeded, {} failed, mean {mean}",
        summary.requested, summary.succeeded, summary.failed
    );
    let distribution: Vec<String> = summary
        .grade_distribution
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(grade, count)| format!("{grade}: {count}"))
        .collect();
    if !distribution.is_empty() {
        println!("{}", distribution.join(", "));
    }
}
