//! Term-by-term credit breakdown.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Attendance, Enrollment, Portfolio, Term};
use crate::results::{TermBreakdown, TermCredits};

/// What the `Full Year` bucket accumulates.
///
/// The default differs from the legacy contract, where `Full Year` only ever
/// summed subjects and dropped portfolio and attendance records labelled
/// `Full Year`. Choose [`FullYearPolicy::SubjectsOnly`] to keep those figures
/// identical to the legacy reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullYearPolicy {
    /// Full Year collects subjects, portfolio and attendance like the terms do.
    #[default]
    AllCategories,
    /// Full Year only collects subjects; portfolio and attendance records
    /// labelled Full Year are dropped.
    SubjectsOnly,
}

impl FullYearPolicy {
    fn accepts_period_records(&self, term: Term) -> bool {
        match self {
            FullYearPolicy::AllCategories => true,
            FullYearPolicy::SubjectsOnly => term != Term::FullYear,
        }
    }
}

#[derive(Clone, Copy)]
enum Column {
    Subjects,
    Portfolio,
    Attendance,
}

/// Re-bucket enrollment, portfolio and attendance credits by term.
///
/// Enrollments without a term land in `Full Year`. Records whose label is
/// not one of the three buckets are dropped.
pub fn decompose_terms(
    enrollments: &[Enrollment],
    portfolio: &[Portfolio],
    attendance: &[Attendance],
    policy: FullYearPolicy,
) -> TermBreakdown {
    let mut buckets: BTreeMap<Term, TermCredits> = BTreeMap::new();

    for enrollment in enrollments {
        let term = match enrollment.term.as_deref() {
            None => Some(Term::FullYear),
            Some(label) => recognize("enrollment", label),
        };
        if let Some(term) = term {
            add(&mut buckets, term, Column::Subjects, enrollment.credits_earned);
        }
    }

    let periods = portfolio
        .iter()
        .map(|p| ("portfolio", Column::Portfolio, p.period.as_deref(), p.credits_earned))
        .chain(
            attendance
                .iter()
                .map(|a| ("attendance", Column::Attendance, a.period.as_deref(), a.credits_earned)),
        );
    for (kind, column, period, earned) in periods {
        let Some(term) = period.and_then(|label| recognize(kind, label)) else {
            if period.is_none() {
                tracing::warn!("dropping {kind} record without a period");
            }
            continue;
        };
        if !policy.accepts_period_records(term) {
            tracing::debug!("dropping {kind} record for {term} under subjects-only policy");
            continue;
        }
        add(&mut buckets, term, column, earned);
    }

    for credits in buckets.values_mut() {
        credits.total = credits
            .subjects
            .saturating_add(credits.portfolio)
            .saturating_add(credits.attendance);
    }

    TermBreakdown::from_buckets(buckets)
}

fn recognize(kind: &str, label: &str) -> Option<Term> {
    match label.parse::<Term>() {
        Ok(term) => Some(term),
        Err(_) => {
            tracing::warn!("dropping {kind} record with unrecognized period '{label}'");
            None
        }
    }
}

fn add(buckets: &mut BTreeMap<Term, TermCredits>, term: Term, column: Column, earned: Option<u32>) {
    let bucket = buckets.entry(term).or_default();
    let earned = earned.unwrap_or(0);
    let slot = match column {
        Column::Subjects => &mut bucket.subjects,
        Column::Portfolio => &mut bucket.portfolio,
        Column::Attendance => &mut bucket.attendance,
    };
    *slot = slot.saturating_add(earned);
}
