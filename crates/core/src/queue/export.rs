use super::metrics::{self, QueueMetrics};
use crate::catalog::Catalog;
use crate::domain::queue::QueueItem;
use crate::domain::stock::StockRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueExport {
    pub exported_at: DateTime<Utc>,
    pub stats: QueueMetrics,
    pub items: Vec<ExportedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedItem {
    #[serde(flatten)]
    pub item: QueueItem,
    pub stock: StockRecord,
}

/// Items the catalog no longer knows are left out of `items` but still
/// counted in `stats`.
pub(super) fn build(
    items: &[QueueItem],
    catalog: &dyn Catalog,
    exported_at: DateTime<Utc>,
) -> QueueExport {
    let exported = items
        .iter()
        .filter_map(|item| {
            let stock = catalog.get_stock(&item.symbol)?;
            Some(ExportedItem {
                item: item.clone(),
                stock: stock.clone(),
            })
        })
        .collect();

    QueueExport {
        exported_at,
        stats: metrics::compute(items, catalog),
        items: exported,
    }
}
