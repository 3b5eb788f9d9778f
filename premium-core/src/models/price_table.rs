use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named price table. Its brackets are stored separately, in entry order.
///
/// `id` is assigned in creation order and is the stable identifier used to
/// choose between several tables linked to one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// For creating new tables (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPriceTable {
    pub name: String,
}
