use super::MemoryError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

type Document<V> = BTreeMap<String, BTreeMap<String, V>>;

/// A `{ domain: { intent: V } }` JSON document held in memory.
///
/// File-backed documents are read once at open and written back on `flush`
/// (temp file + rename). Ephemeral documents never touch disk.
#[derive(Debug)]
pub struct JsonDocument<V> {
    path: Option<PathBuf>,
    data: RwLock<Document<V>>,
}

impl<V> JsonDocument<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Open a file-backed document. A missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let path = path.into();
        let data = match fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn get(&self, domain: &str, intent: &str) -> Option<V> {
        let data = self.data.read().await;
        data.get(domain).and_then(|intents| intents.get(intent)).cloned()
    }

    pub async fn set(&self, domain: &str, intent: &str, value: V) {
        let mut data = self.data.write().await;
        data.entry(domain.to_string())
            .or_default()
            .insert(intent.to_string(), value);
    }

    /// Read-modify-write one entry under the document's write lock.
    pub async fn update<R>(
        &self,
        domain: &str,
        intent: &str,
        f: impl FnOnce(&mut V) -> R,
    ) -> R
    where
        V: Default,
    {
        let mut data = self.data.write().await;
        let entry = data
            .entry(domain.to_string())
            .or_default()
            .entry(intent.to_string())
            .or_default();
        f(entry)
    }

    pub async fn domain(&self, domain: &str) -> BTreeMap<String, V> {
        let data = self.data.read().await;
        data.get(domain).cloned().unwrap_or_default()
    }

    pub async fn entries(&self) -> Vec<(String, String, V)> {
        let data = self.data.read().await;
        data.iter()
            .flat_map(|(domain, intents)| {
                intents
                    .iter()
                    .map(move |(intent, v)| (domain.clone(), intent.clone(), v.clone()))
            })
            .collect()
    }

    pub async fn flush(&self) -> Result<(), MemoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = {
            let data = self.data.read().await;
            serde_json::to_string_pretty(&*data)?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}
