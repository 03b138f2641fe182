//! The `credtrack validate` command.

use std::path::PathBuf;

use anyhow::Result;

use credtrack_store::{load_fixture, validate_fixture};

pub fn execute(fixture_path: PathBuf) -> Result<()> {
    let fixture = load_fixture(&fixture_path)?;

    println!(
        "Fixture: {} ({} students, {} enrollments)",
        fixture_path.display(),
        fixture.student_ids().len(),
        fixture.enrollments.len()
    );

    let warnings = validate_fixture(&fixture);
    for w in &warnings {
        println!("  [student {}] WARNING: {}", w.student_id, w.message);
    }

    if warnings.is_empty() {
        println!("Fixture valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
