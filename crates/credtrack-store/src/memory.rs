//! In-memory store backed by a fixture.
//!
//! Used for demos, the CLI's fixture mode and tests. Supports per-student
//! failure injection and artificial latency so the engine's isolation and
//! deadline handling can be exercised without a real store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use credtrack_core::error::StoreError;
use credtrack_core::model::{
    AcademicYearId, Attendance, Enrollment, Exemption, Portfolio, StudentId, WorkExperience,
};
use credtrack_core::traits::{CreditStore, Query};

use crate::fixture::Fixture;

/// A credit store serving rows from a [`Fixture`].
pub struct MemoryStore {
    fixture: Fixture,
    /// Map of (student, query) → failure message.
    failures: HashMap<(StudentId, Query), String>,
    /// Per-student latency overrides.
    slow_students: HashMap<StudentId, Duration>,
    latency: Option<Duration>,
    call_count: AtomicU32,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryStore {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            failures: HashMap::new(),
            slow_students: HashMap::new(),
            latency: None,
            call_count: AtomicU32::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make `query` fail for `student` with the given message.
    pub fn with_failure(mut self, student: StudentId, query: Query, message: &str) -> Self {
        self.failures.insert((student, query), message.to_string());
        self
    }

    /// Delay every query by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay every query for one student by `latency`.
    pub fn with_slow_student(mut self, student: StudentId, latency: Duration) -> Self {
        self.slow_students.insert(student, latency);
        self
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    /// Get the number of queries made to this store.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Highest number of queries that were in flight at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn track(&self) -> InFlight<'_> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    async fn serve(&self, student: StudentId, query: Query) -> Result<(), StoreError> {
        let delay = self.slow_students.get(&student).copied().or(self.latency);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.get(&(student, query)) {
            Some(message) => Err(StoreError::Failed {
                query,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CreditStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn enrollments(&self, student: StudentId) -> Result<Vec<Enrollment>, StoreError> {
        let _guard = self.track();
        self.serve(student, Query::Enrollments).await?;
        Ok(self
            .fixture
            .enrollments
            .iter()
            .filter(|r| r.student_id == student)
            .cloned()
            .collect())
    }

    async fn work_experience(
        &self,
        student: StudentId,
    ) -> Result<Vec<WorkExperience>, StoreError> {
        let _guard = self.track();
        self.serve(student, Query::WorkExperience).await?;
        Ok(self
            .fixture
            .work_experience
            .iter()
            .filter(|r| r.student_id == student)
            .cloned()
            .collect())
    }

    async fn portfolio(
        &self,
        student: StudentId,
        year: AcademicYearId,
    ) -> Result<Vec<Portfolio>, StoreError> {
        let _guard = self.track();
        self.serve(student, Query::Portfolio).await?;
        Ok(self
            .fixture
            .portfolio
            .iter()
            .filter(|r| r.student_id == student && r.academic_year_id == Some(year))
            .cloned()
            .collect())
    }

    async fn attendance(&self, student: StudentId) -> Result<Vec<Attendance>, StoreError> {
        let _guard = self.track();
        self.serve(student, Query::Attendance).await?;
        Ok(self
            .fixture
            .attendance
            .iter()
            .filter(|r| r.student_id == student)
            .cloned()
            .collect())
    }

    async fn exemptions(&self, student: StudentId) -> Result<Vec<Exemption>, StoreError> {
        let _guard = self.track();
        self.serve(student, Query::Exemptions).await?;
        Ok(self
            .fixture
            .exemptions
            .iter()
            .filter(|r| r.student_id == student)
            .cloned()
            .collect())
    }
}
