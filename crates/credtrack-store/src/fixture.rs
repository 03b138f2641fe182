//! Fixture files backing the in-memory store.
//!
//! A fixture holds the five record tables as JSON or TOML. Validation
//! reports records that the engine would silently ignore or misread.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use credtrack_core::model::{
    Attendance, Enrollment, Exemption, Portfolio, StudentId, Term, WorkExperience,
};

/// The record tables of a credit store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default, alias = "portfolios")]
    pub portfolio: Vec<Portfolio>,
    #[serde(default)]
    pub attendance: Vec<Attendance>,
    #[serde(default, alias = "subject_exemptions")]
    pub exemptions: Vec<Exemption>,
}

impl Fixture {
    /// Every student id that appears in any table, sorted.
    pub fn student_ids(&self) -> Vec<StudentId> {
        let ids: BTreeSet<StudentId> = self
            .enrollments
            .iter()
            .map(|r| r.student_id)
            .chain(self.work_experience.iter().map(|r| r.student_id))
            .chain(self.portfolio.iter().map(|r| r.student_id))
            .chain(self.attendance.iter().map(|r| r.student_id))
            .chain(self.exemptions.iter().map(|r| r.student_id))
            .collect();
        ids.into_iter().collect()
    }
}

/// Load a fixture; `.toml` files are parsed as TOML, anything else as JSON.
pub fn load_fixture(path: &Path) -> Result<Fixture> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture: {}", path.display()))?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("failed to parse TOML fixture: {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON fixture: {}", path.display()))
    }
}

/// A problem found in a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The student the record belongs to.
    pub student_id: StudentId,
    /// Warning message.
    pub message: String,
}

/// Report records the engine would drop or treat as worth nothing.
pub fn validate_fixture(fixture: &Fixture) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |student_id: StudentId, message: String| {
        warnings.push(ValidationWarning {
            student_id,
            message,
        })
    };

    let mut enrolled = HashSet::new();
    for e in &fixture.enrollments {
        if !enrolled.insert((e.student_id, e.effective_subject_id())) {
            warn(
                e.student_id,
                format!("duplicate enrollment in subject {}", e.effective_subject_id()),
            );
        }
        match &e.subject {
            None => warn(
                e.student_id,
                format!(
                    "enrollment in subject {} has no joined subject; it adds nothing to the maximum",
                    e.subject_id
                ),
            ),
            Some(subject) if subject.credit_value.is_none() => warn(
                e.student_id,
                format!("subject {} has no usable credit_value", subject.id),
            ),
            Some(_) => {}
        }
        if let Some(term) = &e.term {
            if term.parse::<Term>().is_err() {
                warn(
                    e.student_id,
                    format!("enrollment term '{term}' is not a recognized term and will be dropped from term breakdowns"),
                );
            }
        }
    }

    let periods = fixture
        .portfolio
        .iter()
        .map(|p| ("portfolio", p.student_id, &p.period))
        .chain(
            fixture
                .attendance
                .iter()
                .map(|a| ("attendance", a.student_id, &a.period)),
        );
    for (kind, student_id, period) in periods {
        match period {
            None => warn(
                student_id,
                format!("{kind} record has no period and will be dropped from term breakdowns"),
            ),
            Some(label) if label.parse::<Term>().is_err() => warn(
                student_id,
                format!("{kind} period '{label}' is not a recognized term and will be dropped from term breakdowns"),
            ),
            Some(_) => {}
        }
    }

    for x in &fixture.exemptions {
        if !enrolled.contains(&(x.student_id, x.subject_id)) {
            warn(
                x.student_id,
                format!(
                    "exemption for subject {} which the student is not enrolled in",
                    x.subject_id
                ),
            );
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "enrollments": [
            {"student_id": 1, "subject_id": 10, "credits_earned": 8, "term": "Term 1",
             "subject": {"id": 10, "credit_value": 10, "type": "core"}},
            {"student_id": 1, "subject_id": 10, "credits_earned": 2, "term": "Term 1",
             "subject": {"id": 10, "credit_value": 10, "type": "core"}},
            {"student_id": 2, "subject_id": 11, "credits_earned": 5, "term": "Semester 1"}
        ],
        "portfolios": [
            {"student_id": 1, "academic_year_id": 1, "period": "Term 3", "credits_earned": 20}
        ],
        "attendance": [
            {"student_id": 3, "credits_earned": 10}
        ],
        "subject_exemptions": [
            {"student_id": 2, "subject_id": 99}
        ]
    }"#;

    #[test]
    fn parse_json_fixture_with_table_aliases() {
        let fixture: Fixture = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(fixture.enrollments.len(), 3);
        assert_eq!(fixture.portfolio.len(), 1);
        assert_eq!(fixture.exemptions.len(), 1);
        assert_eq!(
            fixture.student_ids(),
            vec![StudentId(1), StudentId(2), StudentId(3)]
        );
    }

    #[test]
    fn validation_flags_records_the_engine_ignores() {
        let fixture: Fixture = serde_json::from_str(FIXTURE).unwrap();
        let warnings = validate_fixture(&fixture);
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.iter().any(|m| m.contains("duplicate enrollment in subject 10")));
        assert!(messages.iter().any(|m| m.contains("no joined subject")));
        assert!(messages.iter().any(|m| m.contains("'Semester 1'")));
        assert!(messages.iter().any(|m| m.contains("portfolio period 'Term 3'")));
        assert!(messages.iter().any(|m| m.contains("attendance record has no period")));
        assert!(messages.iter().any(|m| m.contains("subject 99")));
        assert_eq!(warnings.len(), 6);
    }

    #[test]
    fn load_toml_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("school.toml");
        std::fs::write(
            &path,
            r#"
[[enrollments]]
student_id = 4
subject_id = 1
credits_earned = 6
term = "Term 2"

[enrollments.subject]
id = 1
credit_value = 10

[[work_experience]]
student_id = 4
credits_earned = 12
"#,
        )
        .unwrap();

        let fixture = load_fixture(&path).unwrap();
        assert_eq!(fixture.enrollments[0].credit_value(), 10);
        assert_eq!(fixture.work_experience[0].credits_earned, Some(12));
        assert!(validate_fixture(&fixture).is_empty());
    }

    #[test]
    fn missing_fixture_is_an_error() {
        let err = load_fixture(Path::new("does-not-exist.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read fixture"));
    }
}
