mod builtin;

use crate::canonical::normalize;
use crate::domain::stock::StockRecord;
use crate::domain::symbol::CanonicalSymbol;
use std::collections::{BTreeMap, HashMap};

/// Read-only symbol → metadata table consumed by the canonicalizer and queue.
pub trait Catalog: Send + Sync {
    /// Lookup by an already normalized key.
    fn lookup(&self, symbol: &str) -> Option<&StockRecord>;

    /// Canonical target for a normalized alias spelling.
    fn alias(&self, normalized: &str) -> Option<&str>;

    fn all_stocks(&self) -> Vec<&StockRecord>;

    fn get_stock(&self, symbol: &CanonicalSymbol) -> Option<&StockRecord> {
        self.lookup(symbol.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    stocks: BTreeMap<String, StockRecord>,
    aliases: HashMap<String, String>,
}

impl StaticCatalog {
    pub fn new<I, A, K, V>(records: I, aliases: A) -> Self
    where
        I: IntoIterator<Item = StockRecord>,
        A: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut stocks = BTreeMap::new();
        for mut record in records {
            let key = normalize(&record.symbol);
            if key.is_empty() {
                tracing::warn!(id = %record.id, "skipping catalog record with empty symbol");
                continue;
            }
            record.symbol = key.clone();
            stocks.insert(key, record);
        }

        let mut out = HashMap::new();
        for (alias, target) in aliases {
            let alias = normalize(alias.as_ref());
            let target = normalize(target.as_ref());
            if alias.is_empty() || !stocks.contains_key(&target) {
                tracing::warn!(%alias, %target, "dropping alias without a catalog target");
                continue;
            }
            out.insert(alias, target);
        }

        Self {
            stocks,
            aliases: out,
        }
    }

    /// Production dataset shipped with the app.
    pub fn builtin() -> Self {
        Self::new(builtin::records(), builtin::ALIASES.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }
}

impl Catalog for StaticCatalog {
    fn lookup(&self, symbol: &str) -> Option<&StockRecord> {
        self.stocks.get(symbol)
    }

    fn alias(&self, normalized: &str) -> Option<&str> {
        self.aliases.get(normalized).map(String::as_str)
    }

    fn all_stocks(&self) -> Vec<&StockRecord> {
        self.stocks.values().collect()
    }
}
