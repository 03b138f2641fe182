//! Percentage and grade descriptor classification.
//!
//! One classifier serves every caller. Bands have inclusive lower bounds
//! (a score of exactly 70.0 is Merit I). A zero maximum yields 0.0% and the
//! lowest band rather than an arithmetic fault.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Categorical grade derived from percentage achievement, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeDescriptor {
    #[serde(rename = "Distinction")]
    Distinction,
    #[serde(rename = "Merit I")]
    MeritI,
    #[serde(rename = "Merit II")]
    MeritII,
    #[serde(rename = "Pass")]
    Pass,
    #[serde(rename = "Not Yet Achieved")]
    NotYetAchieved,
}

impl GradeDescriptor {
    /// All descriptors ordered from the highest band down.
    pub const ALL: [GradeDescriptor; 5] = [
        GradeDescriptor::Distinction,
        GradeDescriptor::MeritI,
        GradeDescriptor::MeritII,
        GradeDescriptor::Pass,
        GradeDescriptor::NotYetAchieved,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GradeDescriptor::Distinction => "Distinction",
            GradeDescriptor::MeritI => "Merit I",
            GradeDescriptor::MeritII => "Merit II",
            GradeDescriptor::Pass => "Pass",
            GradeDescriptor::NotYetAchieved => "Not Yet Achieved",
        }
    }

    /// Inclusive lower bound of the band, in percent.
    pub fn lower_bound(&self) -> f64 {
        match self {
            GradeDescriptor::Distinction => 85.0,
            GradeDescriptor::MeritI => 70.0,
            GradeDescriptor::MeritII => 55.0,
            GradeDescriptor::Pass => 40.0,
            GradeDescriptor::NotYetAchieved => 0.0,
        }
    }

    /// Long-form wording used on certificates and reports.
    pub fn description(&self) -> &'static str {
        match self {
            GradeDescriptor::Distinction => {
                "Outstanding achievement across all areas of the programme, with exceptional engagement and skill development."
            }
            GradeDescriptor::MeritI => {
                "Very good achievement across the programme, with consistent engagement in most areas."
            }
            GradeDescriptor::MeritII => {
                "Good achievement across the programme, with solid development in key areas."
            }
            GradeDescriptor::Pass => {
                "Satisfactory completion of the programme, meeting the basic requirements."
            }
            GradeDescriptor::NotYetAchieved => {
                "The minimum requirements for completion have not yet been met."
            }
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            GradeDescriptor::Distinction => {
                "Highly suitable for progression to further education or specialised training."
            }
            GradeDescriptor::MeritI | GradeDescriptor::MeritII => {
                "Well prepared for progression to further education."
            }
            GradeDescriptor::Pass => "Ready for progression with appropriate support.",
            GradeDescriptor::NotYetAchieved => {
                "Requires significant additional support before progression."
            }
        }
    }
}

impl fmt::Display for GradeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GradeDescriptor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        GradeDescriptor::ALL
            .into_iter()
            .find(|grade| grade.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown grade descriptor: {trimmed}"))
    }
}

/// A percentage with its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub percentage: f64,
    pub descriptor: GradeDescriptor,
}

/// `earned / possible * 100`, rounded to one decimal and capped at 100.
///
/// Returns 0.0 when `possible` is 0.
pub fn percentage(earned: u32, possible: u32) -> f64 {
    if possible == 0 {
        return 0.0;
    }
    let raw = f64::from(earned) / f64::from(possible) * 100.0;
    round_one_decimal(raw).min(100.0)
}

/// Map a percentage onto its band. Anything below 40 (or NaN) is the lowest band.
pub fn classify(percentage: f64) -> GradeDescriptor {
    GradeDescriptor::ALL
        .into_iter()
        .find(|grade| percentage >= grade.lower_bound())
        .unwrap_or(GradeDescriptor::NotYetAchieved)
}

/// Percentage and descriptor for an earned/possible pair.
pub fn grade(earned: u32, possible: u32) -> Grade {
    let percentage = percentage(earned, possible);
    Grade {
        percentage,
        descriptor: classify(percentage),
    }
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
