use crate::catalog::Catalog;
use crate::domain::symbol::CanonicalSymbol;
use crate::error::QueueError;

pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Map arbitrary user input to a catalog symbol.
///
/// Aliases win over direct lookup. Empty input and anything the catalog does
/// not know resolve to `None`.
pub fn resolve(catalog: &dyn Catalog, raw: &str) -> Option<CanonicalSymbol> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return None;
    }

    let key = catalog.alias(&normalized).unwrap_or(normalized.as_str());
    let stock = catalog.lookup(key)?;
    Some(CanonicalSymbol::new_unchecked(stock.symbol.clone()))
}

pub fn validate(catalog: &dyn Catalog, raw: &str) -> Result<CanonicalSymbol, QueueError> {
    resolve(catalog, raw).ok_or_else(|| QueueError::UnknownSymbol {
        raw: raw.to_string(),
    })
}
