//! The read-only store the engine pulls credit records from.
//!
//! Implemented by the `credtrack-store` crate (in-memory fixtures and a
//! PostgREST adapter).

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{
    AcademicYearId, Attendance, Enrollment, Exemption, Portfolio, StudentId, WorkExperience,
};

/// The five per-student queries the engine issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Enrollments,
    WorkExperience,
    Portfolio,
    Attendance,
    Exemptions,
}

impl Query {
    pub const ALL: [Query; 5] = [
        Query::Enrollments,
        Query::WorkExperience,
        Query::Portfolio,
        Query::Attendance,
        Query::Exemptions,
    ];
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Enrollments => write!(f, "enrollments"),
            Query::WorkExperience => write!(f, "work experience"),
            Query::Portfolio => write!(f, "portfolio"),
            Query::Attendance => write!(f, "attendance"),
            Query::Exemptions => write!(f, "exemptions"),
        }
    }
}

/// Read access to a student's credit-bearing records.
///
/// Every query may fail independently; the engine treats any failure as
/// fatal to that one student's computation.
#[async_trait]
pub trait CreditStore: Send + Sync {
    /// Human-readable store name (e.g. "memory").
    fn name(&self) -> &str;

    /// Enrollments with their joined subject (id, credit value, type).
    async fn enrollments(&self, student: StudentId) -> Result<Vec<Enrollment>, StoreError>;

    async fn work_experience(&self, student: StudentId)
        -> Result<Vec<WorkExperience>, StoreError>;

    /// Portfolio entries scoped to one academic year.
    async fn portfolio(
        &self,
        student: StudentId,
        year: AcademicYearId,
    ) -> Result<Vec<Portfolio>, StoreError>;

    async fn attendance(&self, student: StudentId) -> Result<Vec<Attendance>, StoreError>;

    async fn exemptions(&self, student: StudentId) -> Result<Vec<Exemption>, StoreError>;
}
