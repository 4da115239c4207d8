use crate::catalog::Catalog;
use crate::domain::queue::QueueItem;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMetrics {
    pub total_items: usize,
    pub source_breakdown: BTreeMap<String, usize>,
    pub sentiment_breakdown: BTreeMap<String, usize>,
    pub sector_breakdown: BTreeMap<String, usize>,
    /// Sum of catalog prices, one share per item.
    pub total_value: f64,
    /// `total_value` over all items; 0 for an empty queue.
    pub average_price: f64,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub oldest_item: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub newest_item: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

pub(super) fn compute(items: &[QueueItem], catalog: &dyn Catalog) -> QueueMetrics {
    let mut source_breakdown = BTreeMap::new();
    let mut sentiment_breakdown = BTreeMap::new();
    let mut sector_breakdown = BTreeMap::new();
    let mut total_value = 0.0;

    for item in items {
        if let Some(source) = item.source {
            *source_breakdown.entry(source.to_string()).or_insert(0) += 1;
        }
        if let Some(sentiment) = item.sentiment {
            *sentiment_breakdown.entry(sentiment.to_string()).or_insert(0) += 1;
        }
        if let Some(stock) = catalog.get_stock(&item.symbol) {
            *sector_breakdown.entry(stock.sector.clone()).or_insert(0) += 1;
            total_value += stock.price;
        }
    }

    QueueMetrics {
        total_items: items.len(),
        source_breakdown,
        sentiment_breakdown,
        sector_breakdown,
        total_value: round_cents(total_value),
        average_price: if items.is_empty() {
            0.0
        } else {
            round_cents(total_value / items.len() as f64)
        },
        oldest_item: items.iter().map(|i| i.added_at).min(),
        newest_item: items.iter().map(|i| i.added_at).max(),
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(super) fn check_integrity(items: &[QueueItem], catalog: &dyn Catalog) -> IntegrityReport {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, item) in items.iter().enumerate() {
        if !seen.insert(&item.symbol) {
            errors.push(format!("duplicate symbol {} at position {index}", item.symbol));
        }
        match catalog.get_stock(&item.symbol) {
            None => errors.push(format!("symbol {} is not in the catalog", item.symbol)),
            Some(stock) if stock.id != item.id => errors.push(format!(
                "item id {} does not match catalog id {} for {}",
                item.id, stock.id, item.symbol
            )),
            Some(_) => {}
        }
    }

    IntegrityReport {
        is_valid: errors.is_empty(),
        errors,
    }
}
