//! Batch report with summary statistics and JSON persistence.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::{round_one_decimal, GradeDescriptor};
use crate::model::AcademicYearId;
use crate::results::BatchResult;

/// A bulk credit run, ready to hand to a reporting or export layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub academic_year: AcademicYearId,
    /// Per-student outcomes.
    pub results: BatchResult,
    pub summary: BatchSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Aggregate figures over a batch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mean percentage over successful students, one decimal place.
    pub mean_percentage: Option<f64>,
    /// Students per grade descriptor; every descriptor is present.
    pub grade_distribution: BTreeMap<GradeDescriptor, usize>,
}

impl BatchSummary {
    pub fn compute(results: &BatchResult) -> Self {
        let mut grade_distribution: BTreeMap<GradeDescriptor, usize> =
            GradeDescriptor::ALL.iter().map(|g| (*g, 0)).collect();
        let mut percentage_sum = 0.0f64;

        for (_, summary) in results.summaries() {
            *grade_distribution
                .entry(summary.grade_descriptor)
                .or_default() += 1;
            percentage_sum += summary.percentage;
        }

        let succeeded = results.succeeded();
        let mean_percentage = if succeeded > 0 {
            Some(round_one_decimal(percentage_sum / succeeded as f64))
        } else {
            None
        };

        Self {
            requested: results.len(),
            succeeded,
            failed: results.failed(),
            mean_percentage,
            grade_distribution,
        }
    }
}

impl BatchReport {
    pub fn new(academic_year: AcademicYearId, results: BatchResult, duration_ms: u64) -> Self {
        let summary = BatchSummary::compute(&results);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            academic_year,
            results,
            summary,
            duration_ms,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
