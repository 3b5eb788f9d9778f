//! Reduction of a user-facing age bucket to a single age.
//!
//! Quote screens ask for an age group rather than an exact age. Before a
//! price table can be consulted the bucket is collapsed to one
//! representative integer:
//!
//! | bucket      | representative age          |
//! |-------------|-----------------------------|
//! | `"min-max"` | `floor((min + max) / 2)`    |
//! | `"min+"`    | `min + 5`                   |
//! | `"N"`       | `N`                         |

use thiserror::Error;

use crate::models::BracketLabel;

/// Years added to the lower bound of an open-ended bucket.
pub const OPEN_BUCKET_OFFSET: u32 = 5;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgeBucketError {
    #[error("unrecognized age bucket '{0}'")]
    Unrecognized(String),
}

/// # Examples
///
/// ```
/// use premium_core::pricing::representative_age;
///
/// assert_eq!(representative_age("29-33").unwrap(), 31);
/// assert_eq!(representative_age("59+").unwrap(), 64);
/// assert_eq!(representative_age("45").unwrap(), 45);
/// ```
pub fn representative_age(bucket: &str) -> Result<u32, AgeBucketError> {
    match BracketLabel::parse(bucket) {
        BracketLabel::ClosedRange { min, max } => {
            let midpoint = (u64::from(min) + u64::from(max)) / 2;
            // The midpoint of two u32 values always fits in a u32.
            Ok(midpoint as u32)
        }
        BracketLabel::OpenRange { min } => Ok(min.saturating_add(OPEN_BUCKET_OFFSET)),
        BracketLabel::ExactAge { age } => Ok(age),
        BracketLabel::Malformed { raw } => Err(AgeBucketError::Unrecognized(raw)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn closed_bucket_uses_floored_midpoint() {
        assert_eq!(representative_age("29-33"), Ok(31));
        assert_eq!(representative_age("19-24"), Ok(21));
        assert_eq!(representative_age("0-18"), Ok(9));
    }

    #[test]
    fn open_bucket_adds_offset() {
        assert_eq!(representative_age("59+"), Ok(64));
        assert_eq!(representative_age("0+"), Ok(5));
    }

    #[test]
    fn bare_integer_is_used_directly() {
        assert_eq!(representative_age("45"), Ok(45));
        assert_eq!(representative_age(" 45 "), Ok(45));
    }

    #[test]
    fn extreme_bounds_do_not_overflow() {
        assert_eq!(representative_age("4294967295-4294967295"), Ok(u32::MAX));
        assert_eq!(representative_age("4294967295+"), Ok(u32::MAX));
    }

    #[test]
    fn unrecognized_bucket_is_an_error() {
        assert_eq!(
            representative_age("adults"),
            Err(AgeBucketError::Unrecognized("adults".to_string()))
        );
        assert!(representative_age("").is_err());
        assert!(representative_age("-3").is_err());
    }

    #[test]
    fn reduction_does_not_depend_on_bound_order() {
        assert_eq!(representative_age("33-29"), Ok(31));
    }
}
