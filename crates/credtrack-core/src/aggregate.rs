//! Earned-credit sums and maximum attainable credits.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Earned, Enrollment, Exemption, SubjectId};
use crate::reader::StudentSources;
use crate::results::CategoryCredits;

/// Cap applied to each non-subject category in the reference configuration.
pub const DEFAULT_CATEGORY_CAP: u32 = 20;

/// Fixed maximums for the categories that are not derived from subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCaps {
    #[serde(default = "default_cap")]
    pub work_experience: u32,
    #[serde(default = "default_cap")]
    pub portfolio: u32,
    #[serde(default = "default_cap")]
    pub attendance: u32,
}

fn default_cap() -> u32 {
    DEFAULT_CATEGORY_CAP
}

impl Default for CreditCaps {
    fn default() -> Self {
        Self {
            work_experience: DEFAULT_CATEGORY_CAP,
            portfolio: DEFAULT_CATEGORY_CAP,
            attendance: DEFAULT_CATEGORY_CAP,
        }
    }
}

/// Sum of `credits_earned`, counting absent values as 0.
pub fn sum_earned<R: Earned>(records: &[R]) -> u32 {
    records
        .iter()
        .map(|r| r.credits_earned().unwrap_or(0))
        .fold(0u32, u32::saturating_add)
}

/// Earned credits per category and in total.
pub fn earned_credits(sources: &StudentSources) -> CategoryCredits {
    CategoryCredits::new(
        sum_earned(&sources.enrollments),
        sum_earned(&sources.work_experience),
        sum_earned(&sources.portfolio),
        sum_earned(&sources.attendance),
    )
}

/// Subject ids a student is exempt from.
pub fn exemption_set(exemptions: &[Exemption]) -> BTreeSet<SubjectId> {
    exemptions.iter().map(|e| e.subject_id).collect()
}

/// Sum of `credit_value` over enrollments whose subject is not exempt.
pub fn maximum_subject_credits(
    enrollments: &[Enrollment],
    exempt: &BTreeSet<SubjectId>,
) -> u32 {
    enrollments
        .iter()
        .filter(|e| !exempt.contains(&e.effective_subject_id()))
        .map(Enrollment::credit_value)
        .fold(0u32, u32::saturating_add)
}

/// Maximum attainable credits per category and in total.
pub fn maximum_credits(
    enrollments: &[Enrollment],
    exempt: &BTreeSet<SubjectId>,
    caps: &CreditCaps,
) -> CategoryCredits {
    CategoryCredits::new(
        maximum_subject_credits(enrollments, exempt),
        caps.work_experience,
        caps.portfolio,
        caps.attendance,
    )
}
