//! Adaptive Memory Layer: per-(domain, intent) record of what resolved last.
//!
//! The only policy is last-success-wins promotion. There is no decay, no
//! eviction and no sharing of records across domains.

pub mod document;
pub mod record;
pub mod stats;
pub mod store;

pub use record::{MemoryKey, MemoryRecord};
pub use stats::{IntentSummary, StrategyCounter, StrategyScore, StrategyStats};
pub use store::{DocumentStore, MemoryStore};

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use wayfind_common::strategy::{StrategyDescriptor, StrategyId};

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Memory store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Memory store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Memory store error: {0}")]
    Store(String),
}

pub struct AdaptiveMemory {
    store: Arc<dyn MemoryStore>,
    // Writers for the same key queue here; readers never take it.
    key_locks: DashMap<MemoryKey, Arc<Mutex<()>>>,
}

impl AdaptiveMemory {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            key_locks: DashMap::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(DocumentStore::in_memory()))
    }

    /// The strategy that last resolved this intent on this domain, if any.
    pub async fn get_hint(
        &self,
        domain: &str,
        intent: &str,
    ) -> Result<Option<StrategyId>, MemoryError> {
        let key = MemoryKey::new(domain, intent);
        Ok(self
            .store
            .get(&key)
            .await?
            .and_then(|record| record.last_successful))
    }

    /// Record a resolution outcome. Failures leave memory untouched.
    pub async fn record_outcome(
        &self,
        domain: &str,
        intent: &str,
        strategy: &StrategyDescriptor,
        success: bool,
    ) -> Result<(), MemoryError> {
        if !success {
            return Ok(());
        }

        let key = MemoryKey::new(domain, intent);
        let lock = self.key_locks.entry(key.clone()).or_default().clone();
        let _guard = lock.lock().await;

        let mut record = self.store.get(&key).await?.unwrap_or_default();
        record.record_success(strategy.id());
        debug!(
            "Memory {}: {} now at {} successes",
            key,
            strategy,
            record.success_count(&strategy.id())
        );
        self.store.set(&key, record).await
    }

    pub async fn record(
        &self,
        domain: &str,
        intent: &str,
    ) -> Result<Option<MemoryRecord>, MemoryError> {
        self.store.get(&MemoryKey::new(domain, intent)).await
    }

    pub async fn entries(&self) -> Result<Vec<(MemoryKey, MemoryRecord)>, MemoryError> {
        self.store.entries().await
    }

    pub async fn flush(&self) -> Result<(), MemoryError> {
        self.store.flush().await
    }
}
