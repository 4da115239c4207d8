use serde::{Deserialize, Serialize};

/// Catalog entry. Owned by the catalog; the queue only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub sector: String,
    pub price: f64,
}
