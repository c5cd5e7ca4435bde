//! Append-only decision log. A failing sink never aborts the action it records.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use wayfind_common::protocol::DecisionLogEntry;

pub const DECISION_LOG_FILE: &str = "decisions.jsonl";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Decision log IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decision log serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn append(&self, entry: &DecisionLogEntry) -> Result<(), LogError>;
}

/// One JSON object per line, appended to a file.
pub struct JsonlFileSink {
    path: PathBuf,
    // Keeps lines from concurrent sessions whole.
    write_lock: Mutex<()>,
}

impl JsonlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DECISION_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DecisionSink for JsonlFileSink {
    async fn append(&self, entry: &DecisionLogEntry) -> Result<(), LogError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Keeps entries in memory; used by tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<DecisionLogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<DecisionLogEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl DecisionSink for MemorySink {
    async fn append(&self, entry: &DecisionLogEntry) -> Result<(), LogError> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }
}

#[derive(Clone)]
pub struct DecisionLog {
    sink: Arc<dyn DecisionSink>,
}

impl DecisionLog {
    pub fn new(sink: Arc<dyn DecisionSink>) -> Self {
        Self { sink }
    }

    /// Append, reporting whether the sink accepted the entry.
    pub async fn record(&self, entry: &DecisionLogEntry) -> bool {
        match self.sink.append(entry).await {
            Ok(()) => {
                debug!("Logged decision {} for {}", entry.id, entry.intent);
                true
            }
            Err(e) => {
                warn!("Failed to append decision log entry for {}: {}", entry.intent, e);
                false
            }
        }
    }
}

/// Read back a JSONL decision log, skipping blank lines.
pub async fn read_entries(path: &Path) -> Result<Vec<DecisionLogEntry>, LogError> {
    let content = tokio::fs::read_to_string(path).await?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(LogError::from))
        .collect()
}
