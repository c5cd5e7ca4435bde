use std::path::PathBuf;
use wayfind_engine::config::{ConfigError, ConfigLoader, WayfindConfig};

#[tokio::test]
async fn test_partial_yaml_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wayfind.yaml");
    std::fs::write(
        &path,
        r#"
catalog_path: ./catalog
engine:
  default_timeout_ms: 5000
interstitials:
  intents: [accept_cookies]
"#,
    )
    .unwrap();

    let config = ConfigLoader::load(Some(&path)).await.unwrap();
    assert_eq!(config.catalog_path, PathBuf::from("./catalog"));
    assert_eq!(config.engine.default_timeout_ms, 5000);
    assert_eq!(config.engine.poll_interval_ms, 100);
    assert_eq!(config.engine.settle_ms, 500);
    assert!(config.interstitials.enabled);
    assert_eq!(config.interstitials.intents, vec!["accept_cookies"]);
    assert_eq!(config.interstitials.timeout_ms, 1500);
    assert!(!config.browser.visible);
}

#[tokio::test]
async fn test_empty_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wayfind.yaml");
    std::fs::write(&path, "\n").unwrap();

    let config = ConfigLoader::load_from(&path).await.unwrap();
    let defaults = WayfindConfig::default();
    assert_eq!(config.catalog_path, defaults.catalog_path);
    assert_eq!(config.memory_path, defaults.memory_path);
    assert!(defaults.memory_path.ends_with("memory.json"));
    assert!(defaults.log_dir.ends_with("logs"));
}

#[tokio::test]
async fn test_explicit_missing_path_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::load(Some(&dir.path().join("nope.yaml")))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[tokio::test]
async fn test_malformed_yaml_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wayfind.yaml");
    std::fs::write(&path, "engine: [1, 2").unwrap();
    let err = ConfigLoader::load_from(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
