//! First-match-wins premium lookup over a price table.
//!
//! Brackets are admin-entered free text, so a table may be unsorted, may
//! overlap and may contain labels that are not ages at all. The resolver:
//!
//! 1. classifies every label once into a [`BracketLabel`];
//! 2. drops [`BracketLabel::Malformed`] entries (logged, never an error);
//! 3. walks the remaining brackets in entry order and returns the
//!    first one covering the age.
//!
//! Order is never changed: when brackets overlap the earlier one wins.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use premium_core::pricing::PriceResolver;
//! use premium_core::{NotFoundReason, PriceBracket, Resolution};
//!
//! let table = vec![
//!     PriceBracket::new("0-18", dec!(50)),
//!     PriceBracket::new("19-23", dec!(80)),
//!     PriceBracket::new("59+", dec!(200)),
//! ];
//!
//! let resolver = PriceResolver::new(&table);
//!
//! assert_eq!(
//!     resolver.resolve(21),
//!     Resolution::Found { value: dec!(80), matched_label: "19-23".to_string() }
//! );
//! assert_eq!(
//!     resolver.resolve(40),
//!     Resolution::NotFound { reason: NotFoundReason::NoBracketMatches }
//! );
//! ```

use tracing::{debug, warn};

use crate::models::{BracketLabel, NotFoundReason, PriceBracket, Resolution};

/// A price table classified and ready for lookups.
///
/// Cheap to build and free of interior state; build once per table and call
/// [`PriceResolver::resolve`] for as many ages as needed.
#[derive(Debug, Clone)]
pub struct PriceResolver<'a> {
    candidates: Vec<(BracketLabel, &'a PriceBracket)>,
    configured: bool,
}

impl<'a> PriceResolver<'a> {
    pub fn new(brackets: &'a [PriceBracket]) -> Self {
        let candidates = brackets
            .iter()
            .map(|bracket| (BracketLabel::parse(&bracket.label), bracket))
            .filter(|(label, bracket)| {
                if label.is_malformed() {
                    warn!(label = %bracket.label, "skipping malformed price bracket");
                    false
                } else {
                    true
                }
            })
            .collect();

        Self {
            candidates,
            configured: !brackets.is_empty(),
        }
    }

    /// Number of brackets that can match some age.
    pub fn usable_brackets(&self) -> usize {
        self.candidates.len()
    }

    pub fn resolve(
        &self,
        age: u32,
    ) -> Resolution {
        if !self.configured {
            return Resolution::not_found(NotFoundReason::NoBracketsConfigured);
        }

        match self.candidates.iter().find(|(label, _)| label.covers(age)) {
            Some((_, bracket)) => {
                debug!(age, label = %bracket.label, value = %bracket.value, "bracket matched");
                Resolution::Found {
                    value: bracket.value,
                    matched_label: bracket.label.clone(),
                }
            }
            None => Resolution::not_found(NotFoundReason::NoBracketMatches),
        }
    }
}

/// One-shot form of [`PriceResolver::resolve`].
pub fn resolve(
    brackets: &[PriceBracket],
    age: u32,
) -> Resolution {
    PriceResolver::new(brackets).resolve(age)
}
