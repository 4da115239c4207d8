mod export;
mod metrics;

pub use export::{ExportedItem, QueueExport};
pub use metrics::{IntegrityReport, QueueMetrics};

use crate::canonical;
use crate::catalog::Catalog;
use crate::domain::queue::{QueueItem, QueueMetadata, StoredQueueItem};
use crate::domain::stock::StockRecord;
use crate::domain::symbol::CanonicalSymbol;
use crate::error::QueueError;
use crate::storage::QueuePersistence;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Ordered, deduplicated list of queued symbols.
///
/// Every operation runs resolve, check, mutate and persist under one lock, so
/// concurrent callers can never queue the same symbol twice. Reads hand out
/// copies.
pub struct QueueStore {
    catalog: Arc<dyn Catalog>,
    persistence: QueuePersistence,
    items: Mutex<Vec<QueueItem>>,
}

impl QueueStore {
    pub fn open(catalog: Arc<dyn Catalog>, persistence: QueuePersistence) -> Self {
        Self::open_with_seed::<&str>(catalog, persistence, &[])
    }

    /// Hydrate from `persistence`, falling back to `seed` when nothing usable
    /// is stored. An explicitly stored empty queue is kept empty.
    pub fn open_with_seed<S: AsRef<str>>(
        catalog: Arc<dyn Catalog>,
        persistence: QueuePersistence,
        seed: &[S],
    ) -> Self {
        let items = match persistence.load() {
            Some(stored) => hydrate(&*catalog, stored),
            None => {
                let now = Utc::now();
                let mut out: Vec<QueueItem> = Vec::with_capacity(seed.len());
                for raw in seed {
                    let Some(symbol) = canonical::resolve(&*catalog, raw.as_ref()) else {
                        tracing::warn!(raw = raw.as_ref(), "ignoring unknown seed symbol");
                        continue;
                    };
                    if out.iter().any(|i| i.symbol == symbol) {
                        continue;
                    }
                    if let Some(item) = new_item(&*catalog, symbol, QueueMetadata::default(), now) {
                        out.push(item);
                    }
                }
                out
            }
        };

        tracing::info!(key = persistence.key(), items = items.len(), "queue ready");

        Self {
            catalog,
            persistence,
            items: Mutex::new(items),
        }
    }

    pub fn catalog(&self) -> &dyn Catalog {
        &*self.catalog
    }

    /// Queue `raw` at the tail. Adding a symbol that is already queued, under
    /// any spelling, succeeds with the existing item and changes nothing.
    pub fn add(&self, raw: &str, metadata: QueueMetadata) -> Result<QueueItem, QueueError> {
        let mut items = self.lock();
        let symbol = canonical::validate(&*self.catalog, raw)?;

        if let Some(existing) = items.iter().find(|i| i.symbol == symbol) {
            tracing::debug!(%symbol, "symbol already queued");
            return Ok(existing.clone());
        }

        let item = new_item(&*self.catalog, symbol, metadata, Utc::now()).ok_or_else(|| {
            QueueError::UnknownSymbol {
                raw: raw.to_string(),
            }
        })?;
        items.push(item.clone());
        self.persistence.save(&items);

        tracing::info!(symbol = %item.symbol, source = ?item.source, "queued symbol");
        Ok(item)
    }

    /// Append every resolvable input in order, skipping unknowns and anything
    /// already queued (including earlier inputs of the same batch). The batch is
    /// saved once even when nothing was inserted. Returns the number of
    /// inserted items.
    pub fn add_many<I, S>(&self, raws: I, metadata: QueueMetadata) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items = self.lock();
        let mut seen: HashSet<CanonicalSymbol> = items.iter().map(|i| i.symbol.clone()).collect();
        let now = Utc::now();
        let mut inserted = 0;

        for raw in raws {
            let raw = raw.as_ref();
            let Some(symbol) = canonical::resolve(&*self.catalog, raw) else {
                tracing::debug!(raw, "skipping unknown symbol in batch");
                continue;
            };
            if !seen.insert(symbol.clone()) {
                continue;
            }
            if let Some(item) = new_item(&*self.catalog, symbol, metadata, now) {
                items.push(item);
                inserted += 1;
            }
        }

        self.persistence.save(&items);
        tracing::info!(inserted, total = items.len(), "batch queued");
        inserted
    }

    /// Remove the item for `raw`, keeping the relative order of the rest.
    pub fn remove(&self, raw: &str) -> Result<(), QueueError> {
        let mut items = self.lock();
        let symbol = canonical::validate(&*self.catalog, raw)?;

        let Some(pos) = items.iter().position(|i| i.symbol == symbol) else {
            return Err(QueueError::NotFound { symbol });
        };
        items.remove(pos);
        self.persistence.save(&items);

        tracing::info!(%symbol, "removed symbol from queue");
        Ok(())
    }

    /// Empty the queue. Only for explicit user actions; no other operation
    /// calls this.
    pub fn clear(&self) {
        let mut items = self.lock();
        let removed = items.len();
        items.clear();
        self.persistence.save(&items);
        tracing::info!(removed, "queue cleared");
    }

    pub fn is_present(&self, raw: &str) -> bool {
        let items = self.lock();
        match canonical::resolve(&*self.catalog, raw) {
            Some(symbol) => items.iter().any(|i| i.symbol == symbol),
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Queue order joined with catalog records. Items the catalog no longer
    /// knows are skipped.
    pub fn stocks(&self) -> Vec<StockRecord> {
        let items = self.lock();
        items
            .iter()
            .filter_map(|i| self.catalog.get_stock(&i.symbol).cloned())
            .collect()
    }

    pub fn metrics(&self) -> QueueMetrics {
        let items = self.lock();
        metrics::compute(&items, &*self.catalog)
    }

    /// Timestamped stats plus catalog-joined items, taken under one lock.
    pub fn export(&self) -> QueueExport {
        let items = self.lock();
        export::build(&items, &*self.catalog, Utc::now())
    }

    pub fn validate_integrity(&self) -> IntegrityReport {
        let items = self.lock();
        metrics::check_integrity(&items, &*self.catalog)
    }

    /// Move the listed symbols to the front in the given order. Unlisted items
    /// follow in their current order; unknown or unqueued inputs are ignored.
    /// Returns whether the order changed.
    pub fn reorder<S: AsRef<str>>(&self, order: &[S]) -> bool {
        let mut items = self.lock();

        let mut front: Vec<CanonicalSymbol> = Vec::with_capacity(order.len());
        for raw in order {
            let Some(symbol) = canonical::resolve(&*self.catalog, raw.as_ref()) else {
                continue;
            };
            if !front.contains(&symbol) && items.iter().any(|i| i.symbol == symbol) {
                front.push(symbol);
            }
        }

        let mut reordered: Vec<QueueItem> = Vec::with_capacity(items.len());
        for symbol in &front {
            if let Some(item) = items.iter().find(|i| &i.symbol == symbol) {
                reordered.push(item.clone());
            }
        }
        reordered.extend(items.iter().filter(|i| !front.contains(&i.symbol)).cloned());

        if reordered == *items {
            return false;
        }
        *items = reordered;
        self.persistence.save(&items);
        tracing::info!(moved = front.len(), "queue reordered");
        true
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueueItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for QueueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueStore")
            .field("persistence", &self.persistence)
            .field("len", &self.items.try_lock().ok().map(|items| items.len()))
            .finish_non_exhaustive()
    }
}

fn new_item(
    catalog: &dyn Catalog,
    symbol: CanonicalSymbol,
    metadata: QueueMetadata,
    added_at: chrono::DateTime<Utc>,
) -> Option<QueueItem> {
    let stock = catalog.get_stock(&symbol)?;
    Some(QueueItem {
        id: stock.id.clone(),
        symbol,
        added_at,
        source: metadata.source,
        sentiment: metadata.sentiment,
    })
}

fn hydrate(catalog: &dyn Catalog, stored: Vec<StoredQueueItem>) -> Vec<QueueItem> {
    let total = stored.len();
    let mut out: Vec<QueueItem> = Vec::with_capacity(total);

    for s in stored {
        let Some(symbol) = canonical::resolve(catalog, &s.symbol) else {
            continue;
        };
        if out.iter().any(|i| i.symbol == symbol) {
            continue;
        }
        let metadata = QueueMetadata {
            source: s.source,
            sentiment: s.sentiment,
        };
        if let Some(item) = new_item(catalog, symbol, metadata, s.added_at) {
            out.push(item);
        }
    }

    if out.len() < total {
        tracing::warn!(
            dropped = total - out.len(),
            kept = out.len(),
            "dropped unknown or duplicate entries while loading queue"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::domain::queue::{QueueSource, Sentiment};
    use crate::storage::{Storage, DEFAULT_QUEUE_KEY};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingStorage {
        values: Mutex<HashMap<String, String>>,
        sets: AtomicUsize,
        failing: AtomicBool,
    }

    impl RecordingStorage {
        fn sets(&self) -> usize {
            self.sets.load(Ordering::SeqCst)
        }

        fn raw(&self) -> Option<String> {
            self.values.lock().unwrap().get(DEFAULT_QUEUE_KEY).cloned()
        }
    }

    impl Storage for RecordingStorage {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            anyhow::ensure!(!self.failing.load(Ordering::SeqCst), "storage offline");
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            anyhow::ensure!(!self.failing.load(Ordering::SeqCst), "storage offline");
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    fn open_with(storage: Arc<RecordingStorage>) -> QueueStore {
        QueueStore::open(
            Arc::new(StaticCatalog::builtin()),
            QueuePersistence::new(storage),
        )
    }

    fn fresh() -> (QueueStore, Arc<RecordingStorage>) {
        let storage = Arc::new(RecordingStorage::default());
        (open_with(storage.clone()), storage)
    }

    fn symbols(store: &QueueStore) -> Vec<String> {
        store
            .snapshot()
            .iter()
            .map(|i| i.symbol.to_string())
            .collect()
    }

    fn swipe() -> QueueMetadata {
        QueueMetadata::from_source(QueueSource::Swipe).with_sentiment(Sentiment::Bullish)
    }

    #[test]
    fn add_lowercase_stores_canonical_item() {
        let (store, _) = fresh();
        let item = store.add("nke", swipe()).unwrap();

        assert_eq!(item.symbol, "NKE");
        assert_eq!(item.id, "stk_nke");
        assert_eq!(item.source, Some(QueueSource::Swipe));
        assert_eq!(item.sentiment, Some(Sentiment::Bullish));
        assert_eq!(symbols(&store), vec!["NKE"]);
    }

    #[test]
    fn same_stock_from_two_sources_is_queued_once() {
        let (store, storage) = fresh();
        store.add("NKE", swipe()).unwrap();
        let again = store
            .add("nke", QueueMetadata::from_source(QueueSource::Influencer))
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(again.source, Some(QueueSource::Swipe));
        assert!(store.is_present("NKE"));
        assert!(store.is_present(" nke "));
        assert_eq!(storage.sets(), 1);
    }

    #[test]
    fn case_variants_collapse_to_one_entry() {
        let (store, _) = fresh();
        for raw in ["aapl", "AAPL", "Aapl", "  aapl  ", "\tAAPL\n"] {
            store.add(raw, QueueMetadata::default()).unwrap();
        }
        assert_eq!(symbols(&store), vec!["AAPL"]);
    }

    #[test]
    fn alias_variants_collapse_to_one_entry() {
        let (store, _) = fresh();
        store.add("BRKB", QueueMetadata::default()).unwrap();
        store.add("brk/b", QueueMetadata::default()).unwrap();
        store.add("Berkshire", QueueMetadata::default()).unwrap();
        assert_eq!(symbols(&store), vec!["BRK.B"]);
    }

    #[test]
    fn unknown_symbol_is_rejected_without_mutation() {
        let (store, storage) = fresh();
        let err = store.add("ZZZZ", swipe()).unwrap_err();

        assert!(matches!(err, QueueError::UnknownSymbol { .. }));
        assert!(err.to_string().contains("unknown symbol: ZZZZ"));
        assert_eq!(store.len(), 0);
        assert_eq!(storage.sets(), 0);
    }

    #[test]
    fn empty_symbol_is_rejected() {
        let (store, _) = fresh();
        for raw in ["", "   "] {
            let err = store.add(raw, swipe()).unwrap_err();
            assert_eq!(err.to_string(), "symbol cannot be empty");
        }
        assert!(store.is_empty());
    }

    #[test]
    fn add_stamps_current_time() {
        let (store, _) = fresh();
        let before = Utc::now();
        let item = store.add("AAPL", QueueMetadata::default()).unwrap();
        let after = Utc::now();
        assert!(item.added_at >= before && item.added_at <= after);
    }

    #[test]
    fn add_many_dedupes_within_batch() {
        let (store, storage) = fresh();
        let inserted = store.add_many(["AAPL", "aapl", "MSFT"], QueueMetadata::default());

        assert_eq!(inserted, 2);
        assert_eq!(symbols(&store), vec!["AAPL", "MSFT"]);
        assert_eq!(storage.sets(), 1);
    }

    #[test]
    fn add_many_appends_after_existing_items() {
        let (store, _) = fresh();
        store.add("AAPL", QueueMetadata::default()).unwrap();
        store.add("MSFT", QueueMetadata::default()).unwrap();
        store.add_many(["NKE", "PEP", "AAPL"], QueueMetadata::default());

        assert_eq!(symbols(&store), vec!["AAPL", "MSFT", "NKE", "PEP"]);
    }

    #[test]
    fn add_many_skips_unknowns_and_keeps_existing_metadata() {
        let (store, storage) = fresh();
        store.add("AAPL", swipe()).unwrap();
        let inserted = store.add_many(
            ["ZZZZ", "", "aapl"],
            QueueMetadata::from_source(QueueSource::Bulk),
        );

        assert_eq!(inserted, 0);
        assert_eq!(storage.sets(), 2);
        assert_eq!(store.snapshot()[0].source, Some(QueueSource::Swipe));
    }

    #[test]
    fn remove_preserves_order_of_the_rest() {
        let (store, _) = fresh();
        store.add_many(["AAPL", "MSFT", "GOOGL"], QueueMetadata::default());
        store.remove("MSFT").unwrap();
        assert_eq!(symbols(&store), vec!["AAPL", "GOOGL"]);
    }

    #[test]
    fn remove_by_alias() {
        let (store, _) = fresh();
        store.add("BRKB", QueueMetadata::default()).unwrap();
        assert_eq!(symbols(&store), vec!["BRK.B"]);

        store.remove("BRK-B").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn remove_absent_symbol_is_not_found() {
        let (store, storage) = fresh();
        store.add_many(["AAPL", "NKE"], QueueMetadata::default());
        let sets = storage.sets();

        let err = store.remove("MSFT").unwrap_err();
        assert!(matches!(err, QueueError::NotFound { ref symbol } if symbol == "MSFT"));
        assert_eq!(err.to_string(), "item not found in queue: MSFT");
        assert_eq!(store.len(), 2);
        assert_eq!(storage.sets(), sets);

        let err = store.remove("UNKNOWN").unwrap_err();
        assert!(matches!(err, QueueError::UnknownSymbol { .. }));
        assert_eq!(symbols(&store), vec!["AAPL", "NKE"]);
    }

    #[test]
    fn clear_empties_and_persists() {
        let (store, storage) = fresh();
        store.add_many(["AAPL", "NKE"], QueueMetadata::default());
        store.clear();

        assert!(store.snapshot().is_empty());
        assert_eq!(storage.raw().as_deref(), Some("[]"));
    }

    #[test]
    fn is_present_never_fails_on_bad_input() {
        let (store, _) = fresh();
        store.add("AAPL", QueueMetadata::default()).unwrap();
        assert!(store.is_present("aapl"));
        assert!(!store.is_present("MSFT"));
        assert!(!store.is_present("ZZZZ"));
        assert!(!store.is_present(""));
    }

    #[test]
    fn snapshot_is_independent_copy() {
        let (store, _) = fresh();
        store.add("AAPL", QueueMetadata::default()).unwrap();

        let mut snapshot = store.snapshot();
        snapshot.clear();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn persisted_payload_uses_versioned_key_and_layout() {
        let (store, storage) = fresh();
        store.add("AAPL", swipe()).unwrap();

        let raw = storage.raw().unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v[0]["symbol"], "AAPL");
        assert_eq!(v[0]["id"], "stk_aapl");
        assert_eq!(v[0]["source"], "swipe");
        assert!(v[0]["addedAt"].is_i64());
    }

    #[test]
    fn reopen_restores_state_in_order() {
        let (store, storage) = fresh();
        store.add_many(["NKE", "AAPL", "BRKB"], swipe());
        let before = store.snapshot();
        drop(store);

        let reopened = open_with(storage);
        let after = reopened.snapshot();
        assert_eq!(after.len(), before.len());
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(a.symbol, b.symbol);
            assert_eq!(a.id, b.id);
            assert_eq!(a.added_at.timestamp_millis(), b.added_at.timestamp_millis());
            assert_eq!(a.source, b.source);
            assert_eq!(a.sentiment, b.sentiment);
        }
    }

    #[test]
    fn hydration_drops_unknown_and_duplicate_entries() {
        let storage = Arc::new(RecordingStorage::default());
        storage
            .set(
                DEFAULT_QUEUE_KEY,
                r#"[
                    {"id":"stk_aapl","symbol":"AAPL","addedAt":1},
                    {"id":"x","symbol":"zzzz","addedAt":2},
                    {"id":"stk_aapl","symbol":"aapl","addedAt":3},
                    {"id":"old","symbol":"BRK-B","addedAt":4}
                ]"#,
            )
            .unwrap();

        let store = open_with(storage);
        assert_eq!(symbols(&store), vec!["AAPL", "BRK.B"]);
        assert_eq!(store.snapshot()[1].id, "stk_brk_b");
        assert!(store.validate_integrity().is_valid);
    }

    #[test]
    fn malformed_storage_falls_back_to_seed() {
        let storage = Arc::new(RecordingStorage::default());
        storage.set(DEFAULT_QUEUE_KEY, "not json").unwrap();

        let store = QueueStore::open_with_seed(
            Arc::new(StaticCatalog::builtin()),
            QueuePersistence::new(storage),
            &["nke", "ZZZZ", "NKE", "pep"],
        );
        assert_eq!(symbols(&store), vec!["NKE", "PEP"]);
    }

    #[test]
    fn stored_empty_queue_is_not_reseeded() {
        let storage = Arc::new(RecordingStorage::default());
        storage.set(DEFAULT_QUEUE_KEY, "[]").unwrap();

        let store = QueueStore::open_with_seed(
            Arc::new(StaticCatalog::builtin()),
            QueuePersistence::new(storage),
            &["AAPL"],
        );
        assert!(store.is_empty());
    }

    #[test]
    fn storage_failure_keeps_in_memory_state() {
        let storage = Arc::new(RecordingStorage::default());
        storage.failing.store(true, Ordering::SeqCst);
        let store = open_with(storage.clone());

        store.add("AAPL", QueueMetadata::default()).unwrap();
        store.add_many(["NKE"], QueueMetadata::default());
        assert_eq!(symbols(&store), vec!["AAPL", "NKE"]);
        assert_eq!(storage.sets(), 2);

        store.remove("AAPL").unwrap();
        assert_eq!(symbols(&store), vec!["NKE"]);
    }

    #[test]
    fn stocks_are_joined_in_queue_order() {
        let (store, _) = fresh();
        store.add_many(["AAPL", "nke", "  MSFT  ", "googl"], QueueMetadata::default());

        let stocks = store.stocks();
        assert_eq!(stocks.len(), store.len());
        let names: Vec<&str> = stocks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Apple Inc.",
                "Nike, Inc.",
                "Microsoft Corporation",
                "Alphabet Inc."
            ]
        );
    }

    #[test]
    fn reorder_moves_listed_symbols_to_front() {
        let (store, storage) = fresh();
        store.add_many(["AAPL", "MSFT", "NKE", "PEP"], QueueMetadata::default());
        let sets = storage.sets();

        assert!(store.reorder(&["pep", "ZZZZ", "TSLA", "msft", "PEP"]));
        assert_eq!(symbols(&store), vec!["PEP", "MSFT", "AAPL", "NKE"]);
        assert_eq!(storage.sets(), sets + 1);

        assert!(!store.reorder(&["PEP"]));
        assert_eq!(storage.sets(), sets + 1);
    }

    #[test]
    fn add_many_saves_every_batch() {
        let (store, storage) = fresh();
        store.add_many(["ZZZZ"], QueueMetadata::default());
        assert_eq!(storage.sets(), 1);
        assert_eq!(storage.raw().as_deref(), Some("[]"));
    }

    #[test]
    fn debug_format_does_not_block_while_locked() {
        let (store, _) = fresh();
        store.add("AAPL", QueueMetadata::default()).unwrap();

        let unlocked = format!("{store:?}");
        assert!(unlocked.contains("Some(1)"));

        let _guard = store.lock();
        let locked = format!("{store:?}");
        assert!(locked.contains("None"));
    }

    #[test]
    fn export_joins_items_with_catalog_and_stats() {
        let (store, _) = fresh();
        store.add_many(["nke", "BRKB"], swipe());

        let before = Utc::now();
        let export = store.export();
        assert!(export.exported_at >= before);
        assert_eq!(export.stats.total_items, 2);
        let names: Vec<&str> = export.items.iter().map(|i| i.stock.name.as_str()).collect();
        assert_eq!(names, vec!["Nike, Inc.", "Berkshire Hathaway Inc. Class B"]);
        assert_eq!(export.items[1].item.symbol, "BRK.B");
    }

    #[test]
    fn concurrent_adds_of_one_symbol_insert_once() {
        let (store, _) = fresh();
        let spellings = ["nke", "NKE", " Nke ", "nKe"];

        std::thread::scope(|scope| {
            for raw in spellings.iter().cycle().take(32) {
                let store = &store;
                scope.spawn(move || {
                    store.add(raw, QueueMetadata::default()).unwrap();
                });
            }
        });

        assert_eq!(symbols(&store), vec!["NKE"]);
    }
}
