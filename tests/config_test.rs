//! Tests for config module

use std::collections::HashMap;

use radarr_sonarr_mcp::config::{
    load_config_with_env, save_config, Config, ServerSettings, ServiceConfig, TransportKind,
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RADARR_URL, DEFAULT_SONARR_URL,
};
use serde_json::json;
use tempfile::TempDir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn no_env() -> impl Fn(&str) -> Option<String> {
    env_from(&[])
}

fn write_config(dir: &TempDir, read_only: Option<bool>) -> std::path::PathBuf {
    let mut data = json!({
        "radarr_config": {"api_key": "test", "url": "http://localhost:7878", "base_path": "/api/v3"},
        "sonarr_config": {"api_key": "test", "url": "http://localhost:8989", "base_path": "/api/v3"},
    });
    if let Some(read_only) = read_only {
        data["read_only"] = json!(read_only);
    }
    let path = dir.path().join("config.json");
    std::fs::write(&path, data.to_string()).unwrap();
    path
}

fn sample_config() -> Config {
    Config::new(
        ServiceConfig::new("k", "http://localhost:7878"),
        ServiceConfig::new("k", "http://localhost:8989"),
    )
}

#[test]
fn test_config_defaults_to_read_only_false() {
    assert!(!sample_config().read_only);
}

#[test]
fn test_config_read_only_true() {
    assert!(sample_config().with_read_only(true).read_only);
}

#[test]
fn test_load_config_from_file_read_only_true() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, Some(true));
    let config = load_config_with_env(&path, no_env()).unwrap();
    assert!(config.read_only);
    assert_eq!(config.radarr_config.api_key, "test");
}

#[test]
fn test_load_config_from_file_read_only_false() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, Some(false));
    assert!(!load_config_with_env(&path, no_env()).unwrap().read_only);
}

#[test]
fn test_load_config_from_file_missing_read_only_defaults_false() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, None);
    assert!(!load_config_with_env(&path, no_env()).unwrap().read_only);
}

#[test]
fn test_env_var_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, Some(false));
    let config = load_config_with_env(&path, env_from(&[("READ_ONLY", "true")])).unwrap();
    assert!(config.read_only);
}

#[test]
fn test_env_var_overrides_config_file_to_false() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, Some(true));
    let config = load_config_with_env(&path, env_from(&[("READ_ONLY", "false")])).unwrap();
    assert!(!config.read_only);
}

#[test]
fn test_env_var_accepts_1_and_yes() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, Some(false));
    for value in ["1", "yes", "YES", "on"] {
        let config = load_config_with_env(&path, env_from(&[("READ_ONLY", value)])).unwrap();
        assert!(config.read_only, "READ_ONLY={} should enable read-only", value);
    }
}

#[test]
fn test_env_var_fallback_when_no_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nonexistent.json");
    let env = env_from(&[
        ("READ_ONLY", "true"),
        ("RADARR_API_KEY", "radarr-key"),
        ("SONARR_API_KEY", "sonarr-key"),
        ("SONARR_URL", "http://sonarr:8989"),
    ]);
    let config = load_config_with_env(&path, env).unwrap();
    assert!(config.read_only);
    assert_eq!(config.radarr_config.api_key, "radarr-key");
    assert_eq!(config.radarr_config.url, DEFAULT_RADARR_URL);
    assert_eq!(config.sonarr_config.url, "http://sonarr:8989");
    assert_eq!(config.sonarr_config.base_path, "/api/v3");
}

#[test]
fn test_env_fallback_without_keys_loads_empty_keys() {
    let dir = TempDir::new().unwrap();
    let config = load_config_with_env(dir.path().join("missing.json"), no_env()).unwrap();
    assert!(!config.radarr_config.has_api_key());
    assert!(!config.sonarr_config.has_api_key());
    assert_eq!(config.sonarr_config.url, DEFAULT_SONARR_URL);
    assert!(!config.read_only);
}

#[test]
fn test_invalid_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = load_config_with_env(&path, no_env()).unwrap_err();
    assert!(format!("{:#}", err).contains("config.json"));
}

#[test]
fn test_base_path_defaults_when_missing_in_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        json!({
            "radarr_config": {"api_key": "a", "url": "http://r"},
            "sonarr_config": {"api_key": "b", "url": "http://s"}
        })
        .to_string(),
    )
    .unwrap();
    let config = load_config_with_env(&path, no_env()).unwrap();
    assert_eq!(config.radarr_config.api_root(), "http://r/api/v3");
}

#[test]
fn test_save_config_includes_read_only() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");
    save_config(&sample_config().with_read_only(true), &path).unwrap();

    let data: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(data["read_only"], json!(true));
    assert_eq!(data["radarr_config"]["url"], "http://localhost:7878");

    let reloaded = load_config_with_env(&path, no_env()).unwrap();
    assert_eq!(reloaded, sample_config().with_read_only(true));
}

#[tokio::test]
async fn test_server_settings_defaults() {
    let settings = ServerSettings::default();
    assert_eq!(settings.transport, TransportKind::Sse);
    assert_eq!(settings.host, DEFAULT_HOST);
    assert_eq!(settings.port, 8080);
    assert_eq!(settings.socket_addr().await.unwrap().to_string(), "0.0.0.0:8080");
}

#[tokio::test]
async fn test_server_settings_port_override() {
    let settings = ServerSettings::new("sse", "0.0.0.0", 9000).unwrap();
    assert_eq!(settings.socket_addr().await.unwrap().port(), 9000);
    assert_ne!(settings.port, DEFAULT_PORT);
}

#[test]
fn test_server_settings_transport_parsing() {
    assert_eq!(
        ServerSettings::new("STDIO", "127.0.0.1", 1).unwrap().transport,
        TransportKind::Stdio
    );
    let err = ServerSettings::new("websocket", "127.0.0.1", 1).unwrap_err();
    assert!(err.to_string().contains("sse"));
    assert!(ServerSettings::new("sse", "  ", 1).is_err());
}
