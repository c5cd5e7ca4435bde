use super::MemoryError;
use super::document::JsonDocument;
use super::record::{MemoryKey, MemoryRecord};
use async_trait::async_trait;
use std::path::PathBuf;

/// Persistent keyed store behind the adaptive memory. Last write wins.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn get(&self, key: &MemoryKey) -> Result<Option<MemoryRecord>, MemoryError>;

    async fn set(&self, key: &MemoryKey, record: MemoryRecord) -> Result<(), MemoryError>;

    async fn entries(&self) -> Result<Vec<(MemoryKey, MemoryRecord)>, MemoryError>;

    async fn flush(&self) -> Result<(), MemoryError>;
}

/// Memory records kept in one JSON document, optionally backed by a file.
pub struct DocumentStore {
    document: JsonDocument<MemoryRecord>,
}

impl DocumentStore {
    pub fn in_memory() -> Self {
        Self {
            document: JsonDocument::ephemeral(),
        }
    }

    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        Ok(Self {
            document: JsonDocument::open(path).await?,
        })
    }
}

#[async_trait]
impl MemoryStore for DocumentStore {
    async fn get(&self, key: &MemoryKey) -> Result<Option<MemoryRecord>, MemoryError> {
        Ok(self.document.get(&key.domain, &key.intent).await)
    }

    async fn set(&self, key: &MemoryKey, record: MemoryRecord) -> Result<(), MemoryError> {
        self.document.set(&key.domain, &key.intent, record).await;
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(MemoryKey, MemoryRecord)>, MemoryError> {
        Ok(self
            .document
            .entries()
            .await
            .into_iter()
            .map(|(domain, intent, record)| (MemoryKey::new(domain, intent), record))
            .collect())
    }

    async fn flush(&self) -> Result<(), MemoryError> {
        self.document.flush().await
    }
}
