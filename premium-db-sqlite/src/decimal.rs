use premium_core::{RawPremium, RepositoryError, coerce_premium};
use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};

/// Read a premium column whatever its storage class.
///
/// `price_brackets.value` is untyped, so a row may hold INTEGER, REAL, TEXT
/// or NULL. Numbers convert directly; text goes through the same lenient
/// coercion as the data-store adapter; NULL is zero.
pub fn get_premium(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(Decimal::ZERO);
    }

    let type_name = value_ref.type_info().name().to_string();

    let raw = match type_name.as_str() {
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            return Ok(coerce_integer(val));
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            RawPremium::Number(val)
        }
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            RawPremium::Text(val)
        }
        other => {
            return Err(RepositoryError::Database(format!(
                "Unexpected type '{}' for column '{}'",
                other, column
            )));
        }
    };

    Ok(coerce_premium(&raw))
}

fn coerce_integer(val: i64) -> Decimal {
    if val < 0 {
        tracing::warn!(value = val, "negative premium clamped to zero");
        Decimal::ZERO
    } else {
        Decimal::from(val)
    }
}
