//! Values produced by the engine.
//!
//! These are throwaway results handed back to the caller; nothing here is
//! cached or persisted by the engine.

use std::collections::{btree_map, BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grading::GradeDescriptor;
use crate::model::{StudentId, SubjectId, Term};

/// Per-category credit figures plus their total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCredits {
    pub subjects: u32,
    pub work_experience: u32,
    pub portfolio: u32,
    pub attendance: u32,
    pub total: u32,
}

impl CategoryCredits {
    /// Build from the four categories; `total` is always their sum.
    pub fn new(subjects: u32, work_experience: u32, portfolio: u32, attendance: u32) -> Self {
        let total = subjects
            .saturating_add(work_experience)
            .saturating_add(portfolio)
            .saturating_add(attendance);
        Self {
            subjects,
            work_experience,
            portfolio,
            attendance,
            total,
        }
    }
}

/// A student's earned and attainable credits with their grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditSummary {
    pub credits: CategoryCredits,
    pub maximums: CategoryCredits,
    /// Achievement percentage, one decimal place.
    pub percentage: f64,
    pub grade_descriptor: GradeDescriptor,
    /// Subjects excluded from `maximums.subjects`.
    pub exemptions: BTreeSet<SubjectId>,
}

/// Credit sub-totals for one term bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCredits {
    pub subjects: u32,
    pub portfolio: u32,
    pub attendance: u32,
    pub total: u32,
}

/// Term-by-term credit breakdown, always holding all three buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermBreakdown(BTreeMap<Term, TermCredits>);

impl TermBreakdown {
    pub(crate) fn from_buckets(buckets: BTreeMap<Term, TermCredits>) -> Self {
        let mut map = buckets;
        for term in Term::ALL {
            map.entry(term).or_default();
        }
        Self(map)
    }

    pub fn get(&self, term: Term) -> TermCredits {
        self.0.get(&term).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Term, TermCredits)> + '_ {
        self.0.iter().map(|(term, credits)| (*term, *credits))
    }

    /// Sum of every bucket's total.
    pub fn grand_total(&self) -> u32 {
        self.0
            .values()
            .fold(0u32, |acc, credits| acc.saturating_add(credits.total))
    }
}

/// Outcome for one student in a batch: a summary or an error descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudentOutcome {
    Summary(CreditSummary),
    Failed { error: String },
}

impl StudentOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        StudentOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn summary(&self) -> Option<&CreditSummary> {
        match self {
            StudentOutcome::Summary(summary) => Some(summary),
            StudentOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StudentOutcome::Summary(_) => None,
            StudentOutcome::Failed { error } => Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StudentOutcome::Failed { .. })
    }
}

/// Outcomes keyed by student id, covering every requested student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchResult(BTreeMap<StudentId, StudentOutcome>);

impl BatchResult {
    pub fn insert(&mut self, student: StudentId, outcome: StudentOutcome) {
        self.0.insert(student, outcome);
    }

    pub fn get(&self, student: StudentId) -> Option<&StudentOutcome> {
        self.0.get(&student)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, StudentId, StudentOutcome> {
        self.0.iter()
    }

    pub fn succeeded(&self) -> usize {
        self.0.values().filter(|o| !o.is_failed()).count()
    }

    pub fn failed(&self) -> usize {
        self.0.values().filter(|o| o.is_failed()).count()
    }

    pub fn summaries(&self) -> impl Iterator<Item = (StudentId, &CreditSummary)> + '_ {
        self.0
            .iter()
            .filter_map(|(id, outcome)| outcome.summary().map(|s| (*id, s)))
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = (&'a StudentId, &'a StudentOutcome);
    type IntoIter = btree_map::Iter<'a, StudentId, StudentOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
