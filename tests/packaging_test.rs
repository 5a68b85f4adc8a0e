//! Container image defaults must agree with the binary's own defaults

use radarr_sonarr_mcp::config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TRANSPORT};

const DOCKERFILE: &str = include_str!("../Dockerfile");

/// Instructions of the final (runtime) stage
fn runtime_stage() -> Vec<&'static str> {
    let lines: Vec<&str> = DOCKERFILE.lines().map(str::trim).collect();
    let start = lines
        .iter()
        .rposition(|l| l.starts_with("FROM "))
        .expect("Dockerfile has no FROM");
    lines[start..].to_vec()
}

fn env_value(name: &str) -> Option<String> {
    let prefix = format!("ENV {}=", name);
    runtime_stage()
        .into_iter()
        .find_map(|l| l.strip_prefix(&prefix).map(str::to_string))
}

#[test]
fn test_env_defaults_match_binary() {
    assert_eq!(env_value("MCP_TRANSPORT").as_deref(), Some(DEFAULT_TRANSPORT));
    assert_eq!(env_value("MCP_HOST").as_deref(), Some(DEFAULT_HOST));
    assert_eq!(
        env_value("MCP_PORT").as_deref(),
        Some(DEFAULT_PORT.to_string().as_str())
    );
}

#[test]
fn test_exposes_default_port() {
    let exposed: Vec<String> = runtime_stage()
        .into_iter()
        .filter_map(|l| l.strip_prefix("EXPOSE "))
        .flat_map(|ports| ports.split_whitespace().map(str::to_string))
        .collect();
    assert_eq!(exposed, vec![DEFAULT_PORT.to_string()]);
}

#[test]
fn test_entrypoint_runs_server_binary() {
    let entrypoint = runtime_stage()
        .into_iter()
        .find(|l| l.starts_with("ENTRYPOINT"))
        .expect("no ENTRYPOINT");
    assert!(entrypoint.contains(env!("CARGO_PKG_NAME")));
}

#[test]
fn test_runtime_image_has_ca_certificates() {
    assert!(runtime_stage()
        .iter()
        .any(|l| l.contains("ca-certificates")));
}
