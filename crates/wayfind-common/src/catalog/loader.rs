use super::definition::{IntentDefinition, RawIntent};
use super::registry::IntentCatalog;
use glob::glob;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Failures while loading the intent catalog. Every variant is an invalid catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid catalog: failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid catalog: failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("Invalid catalog: intent '{intent}': {reason}")]
    Invalid { intent: String, reason: String },
    #[error("Invalid catalog: intent '{0}' is defined more than once")]
    Duplicate(String),
    #[error("Invalid catalog: glob error: {0}")]
    Glob(#[from] glob::PatternError),
}

enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Format::Json),
            Some("yaml") | Some("yml") => Some(Format::Yaml),
            _ => None,
        }
    }
}

pub struct CatalogLoader;

impl CatalogLoader {
    /// Load a catalog from a `.json`/`.yaml` file, or merge every such file under a directory.
    pub fn load_path(path: &Path, default_timeout_ms: u64) -> Result<IntentCatalog, CatalogError> {
        if path.is_dir() {
            return Self::load_dir(path, default_timeout_ms);
        }
        let definitions = Self::read_file(path, default_timeout_ms)?;
        IntentCatalog::from_definitions(definitions)
    }

    pub fn load_dir(dir: &Path, default_timeout_ms: u64) -> Result<IntentCatalog, CatalogError> {
        let mut files = Vec::new();
        for ext in ["json", "yaml", "yml"] {
            let pattern = dir.join(format!("**/*.{}", ext));
            let pattern_str = pattern.to_string_lossy().into_owned();
            files.extend(glob(&pattern_str)?.flatten());
        }
        files.sort();

        let mut definitions = Vec::new();
        for file in files {
            definitions.extend(Self::read_file(&file, default_timeout_ms)?);
        }
        IntentCatalog::from_definitions(definitions)
    }

    pub fn from_json_str(
        content: &str,
        default_timeout_ms: u64,
    ) -> Result<IntentCatalog, CatalogError> {
        let raw: BTreeMap<String, RawIntent> =
            serde_json::from_str(content).map_err(|e| CatalogError::Parse {
                path: "<inline>".into(),
                reason: e.to_string(),
            })?;
        IntentCatalog::from_definitions(Self::convert(raw, default_timeout_ms)?)
    }

    pub fn from_yaml_str(
        content: &str,
        default_timeout_ms: u64,
    ) -> Result<IntentCatalog, CatalogError> {
        let raw: BTreeMap<String, RawIntent> =
            serde_yaml::from_str(content).map_err(|e| CatalogError::Parse {
                path: "<inline>".into(),
                reason: e.to_string(),
            })?;
        IntentCatalog::from_definitions(Self::convert(raw, default_timeout_ms)?)
    }

    fn read_file(
        path: &Path,
        default_timeout_ms: u64,
    ) -> Result<Vec<IntentDefinition>, CatalogError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: display.clone(),
            source,
        })?;

        let parse_error = |reason: String| CatalogError::Parse {
            path: display.clone(),
            reason,
        };
        let raw: BTreeMap<String, RawIntent> = match Format::of(path) {
            Some(Format::Yaml) => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
            // JSON is the documented format; unknown extensions are tried as JSON.
            Some(Format::Json) | None => {
                serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
        };

        Self::convert(raw, default_timeout_ms)
    }

    fn convert(
        raw: BTreeMap<String, RawIntent>,
        default_timeout_ms: u64,
    ) -> Result<Vec<IntentDefinition>, CatalogError> {
        raw.into_iter()
            .map(|(name, intent)| intent.into_definition(&name, default_timeout_ms))
            .collect()
    }
}
