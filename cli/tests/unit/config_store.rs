//! Unit tests for the YAML config store.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use pocket_cli::application::ports::ConfigStore;
use pocket_cli::infra::config::YamlConfigStore;
use pocket_common::Backend;
use tempfile::TempDir;

fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let store = YamlConfigStore::at(dir.path().join("absent.yaml"));

    let config = store.load().unwrap();

    assert!(config.namespace.is_none());
    assert_eq!(config.timeouts.poll_interval_secs, 1);
    assert_eq!(config.image_for(Backend::Mongo), "mongo:7");
}

#[test]
fn file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "namespace: data\ntimeouts:\n  cleanup_secs: 3\nimages:\n  postgres: registry.local/psql:16\n",
    );

    let config = YamlConfigStore::at(&path).load().unwrap();

    assert_eq!(config.namespace.as_deref(), Some("data"));
    assert_eq!(config.timeouts.cleanup_secs, 3);
    assert_eq!(config.timeouts.ready_secs, 120);
    assert_eq!(config.image_for(Backend::Postgres), "registry.local/psql:16");
}

#[test]
fn invalid_values_name_the_file_and_key() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "timeouts:\n  poll_interval_secs: 0\n");

    let err = YamlConfigStore::at(&path).load().unwrap_err();
    let message = format!("{err:#}");

    assert!(message.contains(&path.display().to_string()));
    assert!(message.contains("timeouts.poll_interval_secs"));
}

#[test]
fn malformed_yaml_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "timeouts: [1, 2\n");

    let err = YamlConfigStore::at(&path).load().unwrap_err();

    assert!(err.to_string().contains("cannot parse"));
}

#[test]
fn pinned_path_is_reported_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pocket.yaml");

    assert_eq!(YamlConfigStore::at(&path).path().unwrap(), path);
}
