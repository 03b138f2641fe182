//! Record types read from the credit store.
//!
//! The engine never writes these; they are owned by whatever system records
//! enrollments, placements, portfolios and attendance. Credit fields are
//! decoded leniently because the store does not guarantee their shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map($name)
                    .map_err(|_| format!("invalid {}: '{}'", stringify!($name), s.trim()))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name(value)
            }
        }
    };
}

id_type!(
    /// Identifier of a student.
    StudentId
);
id_type!(
    /// Identifier of a subject.
    SubjectId
);
id_type!(
    /// Identifier of an academic year.
    AcademicYearId
);

/// Academic sub-division used to bucket time-scoped credit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    #[serde(rename = "Term 1")]
    Term1,
    #[serde(rename = "Term 2")]
    Term2,
    #[serde(rename = "Full Year")]
    FullYear,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::Term1, Term::Term2, Term::FullYear];

    pub fn label(&self) -> &'static str {
        match self {
            Term::Term1 => "Term 1",
            Term::Term2 => "Term 2",
            Term::FullYear => "Full Year",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Term {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Term::ALL
            .into_iter()
            .find(|term| term.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown term: {trimmed}"))
    }
}

/// The subject joined onto an enrollment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default)]
    pub name: Option<String>,
    /// Credits available for the subject.
    #[serde(default, deserialize_with = "lenient::credits")]
    pub credit_value: Option<u32>,
    /// Subject type (e.g. "core", "optional").
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// A student's enrollment in one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: StudentId,
    pub subject_id: SubjectId,
    #[serde(default, deserialize_with = "lenient::credits")]
    pub credits_earned: Option<u32>,
    /// Raw term label; absent means the whole year.
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default, alias = "subjects")]
    pub subject: Option<Subject>,
}

impl Enrollment {
    /// Id used for exemption matching: the joined subject's id when present.
    pub fn effective_subject_id(&self) -> SubjectId {
        self.subject.as_ref().map(|s| s.id).unwrap_or(self.subject_id)
    }

    /// Credits the enrolled subject is worth, 0 when the join is missing.
    pub fn credit_value(&self) -> u32 {
        self.subject
            .as_ref()
            .and_then(|s| s.credit_value)
            .unwrap_or(0)
    }
}

/// Credits awarded for a work experience placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub student_id: StudentId,
    #[serde(default, deserialize_with = "lenient::credits")]
    pub credits_earned: Option<u32>,
}

/// A portfolio entry for one academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub student_id: StudentId,
    #[serde(default)]
    pub academic_year_id: Option<AcademicYearId>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "lenient::credits")]
    pub credits_earned: Option<u32>,
}

/// Attendance credits for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub student_id: StudentId,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "lenient::credits")]
    pub credits_earned: Option<u32>,
}

/// Excludes a subject from a student's maximum attainable credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemption {
    pub student_id: StudentId,
    pub subject_id: SubjectId,
}

/// Records that carry an earned-credit value.
pub trait Earned {
    fn credits_earned(&self) -> Option<u32>;
}

impl Earned for Enrollment {
    fn credits_earned(&self) -> Option<u32> {
        self.credits_earned
    }
}

impl Earned for WorkExperience {
    fn credits_earned(&self) -> Option<u32> {
        self.credits_earned
    }
}

impl Earned for Portfolio {
    fn credits_earned(&self) -> Option<u32> {
        self.credits_earned
    }
}

impl Earned for Attendance {
    fn credits_earned(&self) -> Option<u32> {
        self.credits_earned
    }
}

/// Decoders that turn malformed credit values into "absent".
pub(crate) mod lenient {
    use std::fmt;

    use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

    struct CreditsVisitor;

    impl<'de> Visitor<'de> for CreditsVisitor {
        type Value = Option<u32>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a credit value")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(u32::try_from(v).ok())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(u32::try_from(v).ok())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 {
                Ok(Some(v.round() as u32))
            } else {
                Ok(None)
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            match v.trim().parse::<f64>() {
                Ok(parsed) => self.visit_f64(parsed),
                Err(_) => Ok(None),
            }
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(CreditsVisitor)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(None)
        }
    }

    pub fn credits<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        d.deserialize_any(CreditsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_display_and_parse() {
        assert_eq!(Term::Term1.to_string(), "Term 1");
        assert_eq!("Full Year".parse::<Term>().unwrap(), Term::FullYear);
        assert_eq!(" term 2 ".parse::<Term>().unwrap(), Term::Term2);
        assert!("Term 3".parse::<Term>().is_err());
        assert!("".parse::<Term>().is_err());
    }

    #[test]
    fn ids_parse_and_serialize_transparently() {
        assert_eq!("42".parse::<StudentId>().unwrap(), StudentId(42));
        assert!("abc".parse::<StudentId>().is_err());
        assert_eq!(serde_json::to_string(&SubjectId(3)).unwrap(), "3");
    }

    #[test]
    fn credits_decode_leniently() {
        let rows: Vec<WorkExperience> = serde_json::from_str(
            r#"[
                {"student_id": 1, "credits_earned": 5},
                {"student_id": 1, "credits_earned": null},
                {"student_id": 1},
                {"student_id": 1, "credits_earned": "7"},
                {"student_id": 1, "credits_earned": "lots"},
                {"student_id": 1, "credits_earned": -3},
                {"student_id": 1, "credits_earned": 2.6},
                {"student_id": 1, "credits_earned": {"nested": true}}
            ]"#,
        )
        .unwrap();
        let values: Vec<Option<u32>> = rows.iter().map(|r| r.credits_earned).collect();
        assert_eq!(
            values,
            vec![Some(5), None, None, Some(7), None, None, Some(3), None]
        );
    }

    #[test]
    fn enrollment_accepts_joined_subjects_key() {
        let row: Enrollment = serde_json::from_str(
            r#"{
                "student_id": 1,
                "subject_id": 9,
                "credits_earned": 8,
                "term": "Term 1",
                "subjects": {"id": 9, "name": "Maths", "credit_value": 10, "type": "core"}
            }"#,
        )
        .unwrap();
        assert_eq!(row.effective_subject_id(), SubjectId(9));
        assert_eq!(row.credit_value(), 10);
        assert_eq!(row.subject.unwrap().kind.as_deref(), Some("core"));
    }

    #[test]
    fn enrollment_without_subject_is_worth_nothing() {
        let row = Enrollment {
            student_id: StudentId(1),
            subject_id: SubjectId(4),
            credits_earned: Some(3),
            term: None,
            subject: None,
        };
        assert_eq!(row.credit_value(), 0);
        assert_eq!(row.effective_subject_id(), SubjectId(4));
    }
}
