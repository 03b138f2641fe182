//! Credit engine: single-student summaries, term breakdowns and batches.
//!
//! Batches run strictly one after another. Students inside a batch run
//! concurrently on the calling task, so at most `batch_size * 5` store
//! queries are in flight at once. A failed student becomes an error entry
//! in the batch result and never affects its siblings.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};

use crate::aggregate::{earned_credits, exemption_set, maximum_credits, CreditCaps};
use crate::error::CreditError;
use crate::grading;
use crate::model::{AcademicYearId, StudentId};
use crate::reader::{read_student_sources, read_term_sources, StudentSources};
use crate::results::{BatchResult, CreditSummary, StudentOutcome, TermBreakdown};
use crate::terms::{decompose_terms, FullYearPolicy};
use crate::traits::CreditStore;

/// Students per batch in the reference configuration.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Configuration for the credit engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Students processed concurrently per batch.
    pub batch_size: usize,
    /// Maximums for work experience, portfolio and attendance.
    pub caps: CreditCaps,
    /// Deadline for each individual store query.
    pub query_timeout: Option<Duration>,
    /// Deadline for a whole batch; students still running get an error entry.
    pub batch_timeout: Option<Duration>,
    /// How the Full Year term bucket is filled.
    pub full_year: FullYearPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            caps: CreditCaps::default(),
            query_timeout: None,
            batch_timeout: None,
            full_year: FullYearPolicy::default(),
        }
    }
}

/// Progress reporting trait for batch runs.
pub trait BatchReporter: Send + Sync {
    fn on_student_start(&self, student: StudentId, batch: usize);
    fn on_student_complete(&self, student: StudentId, summary: &CreditSummary);
    fn on_student_error(&self, student: StudentId, error: &str);
    fn on_batch_complete(&self, batch: usize, succeeded: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl BatchReporter for NoopReporter {
    fn on_student_start(&self, _: StudentId, _: usize) {}
    fn on_student_complete(&self, _: StudentId, _: &CreditSummary) {}
    fn on_student_error(&self, _: StudentId, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Combine a student's sources into a graded summary.
pub fn summarize_sources(sources: &StudentSources, caps: &CreditCaps) -> CreditSummary {
    let exemptions = exemption_set(&sources.exemptions);
    let credits = earned_credits(sources);
    let maximums = maximum_credits(&sources.enrollments, &exemptions, caps);
    let grade = grading::grade(credits.total, maximums.total);

    CreditSummary {
        credits,
        maximums,
        percentage: grade.percentage,
        grade_descriptor: grade.descriptor,
        exemptions,
    }
}

/// The credit aggregation and grading engine.
///
/// Holds no state between calls; every call reads fresh records.
pub struct CreditEngine {
    store: Arc<dyn CreditStore>,
    config: EngineConfig,
}

impl CreditEngine {
    pub fn new(store: Arc<dyn CreditStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Credit summary for one student.
    pub async fn student_credits(
        &self,
        student: StudentId,
        year: AcademicYearId,
    ) -> Result<CreditSummary, CreditError> {
        let sources =
            read_student_sources(self.store.as_ref(), student, year, self.config.query_timeout)
                .await
                .map_err(|source| CreditError::SourceFetch { student, source })?;

        let summary = summarize_sources(&sources, &self.config.caps);
        tracing::debug!(
            %student,
            total = summary.credits.total,
            possible = summary.maximums.total,
            grade = %summary.grade_descriptor,
            "computed credit summary"
        );
        Ok(summary)
    }

    /// Term-by-term breakdown for one student.
    pub async fn term_credits(
        &self,
        student: StudentId,
        year: AcademicYearId,
    ) -> Result<TermBreakdown, CreditError> {
        let sources =
            read_term_sources(self.store.as_ref(), student, year, self.config.query_timeout)
                .await
                .map_err(|source| CreditError::SourceFetch { student, source })?;

        Ok(decompose_terms(
            &sources.enrollments,
            &sources.portfolio,
            &sources.attendance,
            self.config.full_year,
        ))
    }

    /// Summaries for many students, without progress reporting.
    pub async fn bulk_student_credits(
        &self,
        students: &[StudentId],
        year: AcademicYearId,
    ) -> BatchResult {
        self.bulk_student_credits_with(students, year, &NoopReporter)
            .await
    }

    /// Summaries for many students, reporting progress as students settle.
    ///
    /// Repeated ids are processed once, at their first position, so the result
    /// has one entry per distinct requested id.
    pub async fn bulk_student_credits_with(
        &self,
        students: &[StudentId],
        year: AcademicYearId,
        progress: &dyn BatchReporter,
    ) -> BatchResult {
        let batch_size = self.config.batch_size.max(1);
        let mut results = BatchResult::default();

        let mut seen = HashSet::new();
        let students: Vec<StudentId> = students
            .iter()
            .copied()
            .filter(|student| seen.insert(*student))
            .collect();

        for (index, batch) in students.chunks(batch_size).enumerate() {
            let start = Instant::now();
            let deadline = self
                .config
                .batch_timeout
                .map(|limit| (tokio::time::Instant::now() + limit, limit));

            let mut pending = FuturesUnordered::new();
            for &student in batch {
                progress.on_student_start(student, index);
                pending.push(async move {
                    let outcome = match deadline {
                        Some((at, limit)) => {
                            tokio::time::timeout_at(at, self.student_credits(student, year))
                                .await
                                .unwrap_or_else(|_| {
                                    Err(CreditError::DeadlineExceeded {
                                        student,
                                        after_ms: limit.as_millis() as u64,
                                    })
                                })
                        }
                        None => self.student_credits(student, year).await,
                    };
                    (student, outcome)
                });
            }

            let mut succeeded = 0usize;
            let mut failed = 0usize;
            while let Some((student, outcome)) = pending.next().await {
                match outcome {
                    Ok(summary) => {
                        progress.on_student_complete(student, &summary);
                        results.insert(student, StudentOutcome::Summary(summary));
                        succeeded += 1;
                    }
                    Err(e) => {
                        tracing::warn!("credit calculation failed for student {student}: {e}");
                        progress.on_student_error(student, &e.to_string());
                        results.insert(student, StudentOutcome::failed(e.to_string()));
                        failed += 1;
                    }
                }
            }

            let elapsed = start.elapsed();
            tracing::info!(
                batch = index,
                succeeded,
                failed,
                elapsed_ms = elapsed.as_millis() as u64,
                "batch complete"
            );
            progress.on_batch_complete(index, succeeded, failed, elapsed);
        }

        results
    }
}
