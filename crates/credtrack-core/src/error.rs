//! Store and engine error types.
//!
//! `StoreError` is defined here rather than in an adapter crate so that the
//! engine can tell which query failed without string matching.

use thiserror::Error;

use crate::model::StudentId;
use crate::traits::Query;

/// Errors reported by a [`CreditStore`](crate::traits::CreditStore) query.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered but reported a failure for the query.
    #[error("{query} query failed: {message}")]
    Failed { query: Query, message: String },

    /// The query did not answer within its deadline.
    #[error("{query} query timed out after {after_ms}ms")]
    Timeout { query: Query, after_ms: u64 },

    /// The rows returned by the store could not be decoded.
    #[error("failed to decode {query} rows: {message}")]
    Decode { query: Query, message: String },

    /// The store rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The store could not be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// The query this error belongs to, if it is query-specific.
    pub fn query(&self) -> Option<Query> {
        match self {
            StoreError::Failed { query, .. }
            | StoreError::Timeout { query, .. }
            | StoreError::Decode { query, .. } => Some(*query),
            StoreError::AuthenticationFailed(_) | StoreError::Unavailable(_) => None,
        }
    }
}

/// Errors surfaced by single-student engine calls.
#[derive(Debug, Error)]
pub enum CreditError {
    /// One of the student's source queries failed.
    #[error("failed to read credit sources for student {student}: {source}")]
    SourceFetch {
        student: StudentId,
        #[source]
        source: StoreError,
    },

    /// The student's pipeline was still running when its batch deadline passed.
    #[error("student {student} did not finish within the batch deadline of {after_ms}ms")]
    DeadlineExceeded { student: StudentId, after_ms: u64 },
}

impl CreditError {
    pub fn student(&self) -> StudentId {
        match self {
            CreditError::SourceFetch { student, .. }
            | CreditError::DeadlineExceeded { student, .. } => *student,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_names_the_failing_query() {
        let err = StoreError::Timeout {
            query: Query::Portfolio,
            after_ms: 250,
        };
        assert_eq!(err.to_string(), "portfolio query timed out after 250ms");
        assert_eq!(err.query(), Some(Query::Portfolio));
        assert_eq!(StoreError::Unavailable("down".into()).query(), None);
    }

    #[test]
    fn credit_error_keeps_store_error_as_source() {
        let err = CreditError::SourceFetch {
            student: StudentId(7),
            source: StoreError::Failed {
                query: Query::Exemptions,
                message: "relation does not exist".into(),
            },
        };
        assert_eq!(err.student(), StudentId(7));
        assert!(err.to_string().contains("student 7"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().starts_with("exemptions query failed"));
    }
}
