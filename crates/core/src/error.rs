use crate::domain::symbol::CanonicalSymbol;

/// Rejections returned to callers of the queue store. Neither variant implies
/// the queue changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("{}", unknown_symbol_message(.raw))]
    UnknownSymbol { raw: String },

    #[error("item not found in queue: {symbol}")]
    NotFound { symbol: CanonicalSymbol },
}

fn unknown_symbol_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "symbol cannot be empty".to_string()
    } else {
        format!("unknown symbol: {}", trimmed.to_uppercase())
    }
}

/// Durable save/load failures. These never leave the storage module.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0:#}")]
    Storage(anyhow::Error),

    #[error("failed to serialize queue: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("persisted queue is malformed: {0}")]
    Malformed(#[source] serde_json::Error),
}
