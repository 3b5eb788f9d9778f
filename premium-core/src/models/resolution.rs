use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why no premium could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    /// The table has brackets, but none covers the requested age.
    NoBracketMatches,
    /// There are no brackets at all (or no table is linked).
    NoBracketsConfigured,
}

impl NotFoundReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoBracketMatches => "no_bracket_matches",
            Self::NoBracketsConfigured => "no_brackets_configured",
        }
    }
}

impl fmt::Display for NotFoundReason {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of looking up a premium for one age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Found {
        value: Decimal,
        matched_label: String,
    },
    NotFound {
        reason: NotFoundReason,
    },
}

impl Resolution {
    pub fn not_found(reason: NotFoundReason) -> Self {
        Self::NotFound { reason }
    }

    /// The premium, if one was found.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Self::Found { value, .. } => Some(*value),
            Self::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}
