use std::fmt;

use serde::{Deserialize, Serialize};

/// Typed form of a bracket's free-text age descriptor.
///
/// Admins type these by hand, so any label is accepted: anything that does
/// not fit one of the three recognised shapes becomes [`BracketLabel::Malformed`]
/// and never matches an age.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BracketLabel {
    /// `"min-max"`, both bounds inclusive.
    ClosedRange { min: u32, max: u32 },
    /// `"min+"`, no upper bound.
    OpenRange { min: u32 },
    /// `"N"`, a single age.
    ExactAge { age: u32 },
    /// Anything else, kept verbatim for diagnostics.
    Malformed { raw: String },
}

impl BracketLabel {
    /// Classify a raw label.
    ///
    /// Shape is decided before content: a label containing `-` is always a
    /// closed range, one ending in `+` an open range, everything else an exact
    /// age. Whitespace around each number is ignored.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        let parsed = if let Some((min, max)) = trimmed.split_once('-') {
            parse_age(min)
                .zip(parse_age(max))
                .map(|(min, max)| Self::ClosedRange { min, max })
        } else if let Some(min) = trimmed.strip_suffix('+') {
            parse_age(min).map(|min| Self::OpenRange { min })
        } else {
            parse_age(trimmed).map(|age| Self::ExactAge { age })
        };

        parsed.unwrap_or_else(|| Self::Malformed {
            raw: raw.to_string(),
        })
    }

    /// Whether `age` falls inside this bracket. Malformed labels cover nothing.
    pub fn covers(
        &self,
        age: u32,
    ) -> bool {
        match *self {
            Self::ClosedRange { min, max } => min <= age && age <= max,
            Self::OpenRange { min } => age >= min,
            Self::ExactAge { age: exact } => age == exact,
            Self::Malformed { .. } => false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

impl From<&str> for BracketLabel {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for BracketLabel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::ClosedRange { min, max } => write!(f, "{min}-{max}"),
            Self::OpenRange { min } => write!(f, "{min}+"),
            Self::ExactAge { age } => write!(f, "{age}"),
            Self::Malformed { raw } => f.write_str(raw),
        }
    }
}

fn parse_age(s: &str) -> Option<u32> {
    s.trim().parse().ok()
}
