use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One row of a price table: an age descriptor and its monthly premium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBracket {
    /// Raw descriptor as entered, e.g. `"19-23"`, `"59+"` or `"0"`.
    pub label: String,
    /// Monthly premium, never negative.
    pub value: Decimal,
}

impl PriceBracket {
    pub fn new(
        label: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Premium as it arrives from the data store: admins may have saved either
/// a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPremium {
    Number(f64),
    Text(String),
}

/// Bracket row in the data store's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceBracket {
    #[serde(rename = "faixa_etaria")]
    pub age_range: String,
    #[serde(rename = "valor", default)]
    pub value: Option<RawPremium>,
}

impl From<RawPriceBracket> for PriceBracket {
    fn from(raw: RawPriceBracket) -> Self {
        let value = raw.value.as_ref().map_or(Decimal::ZERO, coerce_premium);
        PriceBracket {
            label: raw.age_range,
            value,
        }
    }
}

/// Coerce a stored premium into a non-negative decimal.
///
/// Text is read the way a lenient float parser would: the longest numeric
/// prefix wins (`"150,50"` is 150), exponents are accepted, and anything
/// unreadable is zero. An exponent too large for a decimal is unreadable,
/// not truncated to its mantissa. Negative amounts and `-0` become zero.
pub fn coerce_premium(raw: &RawPremium) -> Decimal {
    let value = match raw {
        RawPremium::Number(n) => Decimal::try_from(*n).ok(),
        RawPremium::Text(s) => parse_lenient(s),
    };

    match value {
        Some(v) if v.is_zero() => Decimal::ZERO,
        Some(v) if v.is_sign_negative() => {
            warn!(?raw, "negative premium clamped to zero");
            Decimal::ZERO
        }
        Some(v) => v,
        None => {
            warn!(?raw, "unreadable premium treated as zero");
            Decimal::ZERO
        }
    }
}

fn parse_lenient(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if let Ok(d) = Decimal::from_str(s) {
        return Some(d);
    }
    if let Ok(d) = Decimal::from_scientific(s) {
        return Some(d);
    }
    if is_exponent_form(s) {
        return None;
    }
    let prefix = numeric_prefix(s);
    if prefix.is_empty() {
        return None;
    }
    Decimal::from_str(prefix).ok()
}

/// `s` is a whole `mantissa[eE][+-]digits` number, e.g. `"9e40"`.
fn is_exponent_form(s: &str) -> bool {
    let Some((mantissa, exponent)) = s.split_once(['e', 'E']) else {
        return false;
    };
    let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    !mantissa.is_empty()
        && numeric_prefix(mantissa) == mantissa
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Longest `[+-]digits[.digits]` prefix of `s`.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if has_digits { &s[..end] } else { "" }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn text(s: &str) -> RawPremium {
        RawPremium::Text(s.to_string())
    }

    #[test]
    fn coerces_plain_decimal_text() {
        assert_eq!(coerce_premium(&text("150.50")), dec!(150.50));
    }

    #[test]
    fn coerces_number() {
        assert_eq!(coerce_premium(&RawPremium::Number(150.0)), dec!(150));
        assert_eq!(coerce_premium(&RawPremium::Number(89.9)), dec!(89.9));
    }

    #[test]
    fn coerces_text_with_surrounding_whitespace() {
        assert_eq!(coerce_premium(&text("  99.90 ")), dec!(99.90));
    }

    #[test]
    fn coerces_numeric_prefix() {
        assert_eq!(coerce_premium(&text("150,50")), dec!(150));
        assert_eq!(coerce_premium(&text("200 reais")), dec!(200));
        assert_eq!(coerce_premium(&text("89.90/mês")), dec!(89.90));
    }

    #[test]
    fn coerces_scientific_notation() {
        assert_eq!(coerce_premium(&text("1e3")), dec!(1000));
    }

    #[test]
    fn out_of_range_exponent_is_zero() {
        assert_eq!(coerce_premium(&text("9e40")), Decimal::ZERO);
        assert_eq!(coerce_premium(&text("1e99999999999")), Decimal::ZERO);
        assert_eq!(coerce_premium(&text("2.5E+3")), dec!(2500));
    }

    #[test]
    fn trailing_text_after_exponent_still_uses_prefix() {
        assert_eq!(coerce_premium(&text("1e3 reais")), dec!(1));
    }

    #[test]
    fn negative_zero_is_plain_zero() {
        let from_number = coerce_premium(&RawPremium::Number(-0.0));
        let from_text = coerce_premium(&text("-0.00"));

        assert_eq!(from_number.to_string(), "0");
        assert!(!from_number.is_sign_negative());
        assert!(!from_text.is_sign_negative());
    }

    #[test]
    fn unreadable_text_is_zero() {
        assert_eq!(coerce_premium(&text("abc")), Decimal::ZERO);
        assert_eq!(coerce_premium(&text("")), Decimal::ZERO);
        assert_eq!(coerce_premium(&text("-")), Decimal::ZERO);
        assert_eq!(coerce_premium(&text(".")), Decimal::ZERO);
    }

    #[test]
    fn non_finite_number_is_zero() {
        assert_eq!(coerce_premium(&RawPremium::Number(f64::NAN)), Decimal::ZERO);
        assert_eq!(
            coerce_premium(&RawPremium::Number(f64::INFINITY)),
            Decimal::ZERO
        );
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        assert_eq!(coerce_premium(&text("-10")), Decimal::ZERO);
        assert_eq!(coerce_premium(&RawPremium::Number(-3.5)), Decimal::ZERO);
    }

    #[test]
    fn raw_bracket_deserializes_number_valor() {
        let raw: RawPriceBracket =
            serde_json::from_str(r#"{"faixa_etaria": "19-23", "valor": 80}"#).unwrap();

        let bracket = PriceBracket::from(raw);

        assert_eq!(bracket, PriceBracket::new("19-23", dec!(80)));
    }

    #[test]
    fn raw_bracket_deserializes_string_valor() {
        let raw: RawPriceBracket =
            serde_json::from_str(r#"{"faixa_etaria": "59+", "valor": "200.00"}"#).unwrap();

        let bracket = PriceBracket::from(raw);

        assert_eq!(bracket, PriceBracket::new("59+", dec!(200.00)));
    }

    #[test]
    fn raw_bracket_with_missing_or_null_valor_is_zero() {
        let missing: RawPriceBracket = serde_json::from_str(r#"{"faixa_etaria": "0"}"#).unwrap();
        let null: RawPriceBracket =
            serde_json::from_str(r#"{"faixa_etaria": "0", "valor": null}"#).unwrap();

        assert_eq!(PriceBracket::from(missing).value, Decimal::ZERO);
        assert_eq!(PriceBracket::from(null).value, Decimal::ZERO);
    }
}
