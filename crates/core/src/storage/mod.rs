pub mod file;
pub mod memory;
pub mod persistence;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use persistence::{QueuePersistence, DEFAULT_QUEUE_KEY};

/// Narrow string key-value port the queue persists through.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}
