//! Concurrent, all-or-nothing reads of a student's credit sources.
//!
//! The queries are joined on the calling task. The first failure is
//! returned and the queries still in flight are dropped with it.

use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;
use crate::model::{
    AcademicYearId, Attendance, Enrollment, Exemption, Portfolio, StudentId, WorkExperience,
};
use crate::traits::{CreditStore, Query};

/// Everything the summary pipeline needs for one student.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentSources {
    pub enrollments: Vec<Enrollment>,
    pub work_experience: Vec<WorkExperience>,
    pub portfolio: Vec<Portfolio>,
    pub attendance: Vec<Attendance>,
    pub exemptions: Vec<Exemption>,
}

/// The time-scoped subset used by the term breakdown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermSources {
    pub enrollments: Vec<Enrollment>,
    pub portfolio: Vec<Portfolio>,
    pub attendance: Vec<Attendance>,
}

/// Fetch all five sources for a student.
pub async fn read_student_sources(
    store: &dyn CreditStore,
    student: StudentId,
    year: AcademicYearId,
    query_timeout: Option<Duration>,
) -> Result<StudentSources, StoreError> {
    let (enrollments, work_experience, portfolio, attendance, exemptions) = futures::try_join!(
        bounded(Query::Enrollments, query_timeout, store.enrollments(student)),
        bounded(
            Query::WorkExperience,
            query_timeout,
            store.work_experience(student)
        ),
        bounded(Query::Portfolio, query_timeout, store.portfolio(student, year)),
        bounded(Query::Attendance, query_timeout, store.attendance(student)),
        bounded(Query::Exemptions, query_timeout, store.exemptions(student)),
    )?;

    tracing::debug!(
        %student,
        enrollments = enrollments.len(),
        work_experience = work_experience.len(),
        portfolio = portfolio.len(),
        attendance = attendance.len(),
        exemptions = exemptions.len(),
        "read credit sources"
    );

    Ok(StudentSources {
        enrollments,
        work_experience,
        portfolio,
        attendance,
        exemptions,
    })
}

/// Fetch enrollments, portfolio and attendance for a student.
pub async fn read_term_sources(
    store: &dyn CreditStore,
    student: StudentId,
    year: AcademicYearId,
    query_timeout: Option<Duration>,
) -> Result<TermSources, StoreError> {
    let (enrollments, portfolio, attendance) = futures::try_join!(
        bounded(Query::Enrollments, query_timeout, store.enrollments(student)),
        bounded(Query::Portfolio, query_timeout, store.portfolio(student, year)),
        bounded(Query::Attendance, query_timeout, store.attendance(student)),
    )?;

    Ok(TermSources {
        enrollments,
        portfolio,
        attendance,
    })
}

async fn bounded<T, F>(query: Query, limit: Option<Duration>, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| StoreError::Timeout {
                query,
                after_ms: limit.as_millis() as u64,
            })?,
        None => fut.await,
    }
}
