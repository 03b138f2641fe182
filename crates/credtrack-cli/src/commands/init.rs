//! The `credtrack init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("credtrack.toml").exists() {
        println!("credtrack.toml already exists, skipping.");
    } else {
        std::fs::write("credtrack.toml", SAMPLE_CONFIG)?;
        println!("Created credtrack.toml");
    }

    std::fs::create_dir_all("fixtures")?;
    let example_path = std::path::Path::new("fixtures/example.json");
    if example_path.exists() {
        println!("fixtures/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_FIXTURE)?;
        println!("Created fixtures/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: credtrack validate --fixture fixtures/example.json");
    println!("  2. Run: credtrack student --student 1 --year 1");
    println!("  3. Point [store] at your PostgREST endpoint when ready");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# credtrack configuration

batch_size = 10
query_timeout_ms = 5000
full_year_policy = "all_categories"

[store]
type = "memory"
fixture = "fixtures/example.json"

# [store]
# type = "rest"
# base_url = "https://your-project.supabase.co"
# api_key = "${CREDTRACK_API_KEY}"

[caps]
work_experience = 20
portfolio = 20
attendance = 20
"#;

const EXAMPLE_FIXTURE: &str = r#"{
  "enrollments": [
    {"student_id": 1, "subject_id": 10, "credits_earned": 8, "term": "Term 1",
     "subjects": {"id": 10, "name": "Mathematics", "credit_value": 10, "type": "core"}},
    {"student_id": 1, "subject_id": 11, "credits_earned": 9, "term": "Term 2",
     "subjects": {"id": 11, "name": "English", "credit_value": 10, "type": "core"}},
    {"student_id": 1, "subject_id": 12, "credits_earned": 7, "term": "Full Year",
     "subjects": {"id": 12, "name": "Science", "credit_value": 10, "type": "core"}}
  ],
  "work_experience": [
    {"student_id": 1, "credits_earned": 12}
  ],
  "portfolios": [
    {"student_id": 1, "academic_year_id": 1, "period": "Term 1", "credits_earned": 15}
  ],
  "attendance": [
    {"student_id": 1, "period": "Term 1", "credits_earned": 9},
    {"student_id": 1, "period": "Term 2", "credits_earned": 10}
  ],
  "subject_exemptions": []
}
"#;
