pub mod canonical;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod queue;
pub mod storage;

pub mod config {
    use crate::catalog::StaticCatalog;
    use crate::queue::QueueStore;
    use crate::storage::{FileStorage, MemoryStorage, QueuePersistence, Storage, DEFAULT_QUEUE_KEY};
    use std::path::PathBuf;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub storage_dir: Option<PathBuf>,
        pub queue_key: String,
        pub queue_seed: Vec<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                storage_dir: None,
                queue_key: DEFAULT_QUEUE_KEY.to_string(),
                queue_seed: Vec::new(),
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let queue_key = std::env::var("SWIPR_QUEUE_KEY")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_QUEUE_KEY.to_string());

            Ok(Self {
                storage_dir: std::env::var("SWIPR_STORAGE_DIR")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
                queue_key,
                queue_seed: std::env::var("SWIPR_QUEUE_SEED")
                    .map(|s| parse_seed(&s))
                    .unwrap_or_default(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        /// File storage when a directory is configured, in-memory otherwise.
        pub fn build_storage(&self) -> Arc<dyn Storage> {
            match &self.storage_dir {
                Some(dir) => Arc::new(FileStorage::new(dir)),
                None => {
                    tracing::warn!("SWIPR_STORAGE_DIR not set; queue will not survive restarts");
                    Arc::new(MemoryStorage::new())
                }
            }
        }

        pub fn open_queue(&self) -> QueueStore {
            let persistence = QueuePersistence::with_key(self.build_storage(), self.queue_key.clone());
            QueueStore::open_with_seed(
                Arc::new(StaticCatalog::builtin()),
                persistence,
                self.queue_seed.as_slice(),
            )
        }
    }

    fn parse_seed(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

}
