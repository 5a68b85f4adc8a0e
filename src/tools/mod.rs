//! Tools module - MCP tools backed by the Radarr and Sonarr APIs

pub mod radarr;
pub mod shared;
pub mod sonarr;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::arr::{RadarrApi, SonarrApi};
use crate::config::Config;

/// Tools that change state on Radarr/Sonarr; hidden and refused in read-only mode
pub const WRITE_TOOLS: &[&str] = &[
    "add_radarr_movie",
    "add_sonarr_series",
    "delete_radarr_movie",
    "delete_sonarr_series",
    "update_radarr_movie",
    "update_sonarr_series",
    "monitor_sonarr_episodes",
    "remove_from_queue",
    "manual_import",
    "execute_command",
    "refresh_monitored",
];

pub fn is_write_tool(name: &str) -> bool {
    WRITE_TOOLS.contains(&name)
}

/// Static tool definition
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> Value,
}

impl ToolDef {
    pub fn is_write(&self) -> bool {
        is_write_tool(self.name)
    }
}

/// All tools, Radarr first, then Sonarr, then the service-generic ones
pub fn all_tools() -> impl Iterator<Item = &'static ToolDef> {
    radarr::TOOLS
        .iter()
        .chain(sonarr::TOOLS.iter())
        .chain(shared::TOOLS.iter())
}

fn defines(tools: &[ToolDef], name: &str) -> bool {
    tools.iter().any(|t| t.name == name)
}

pub fn find_tool(name: &str) -> Option<&'static ToolDef> {
    all_tools().find(|t| t.name == name)
}

/// Tools visible to clients; write tools are dropped in read-only mode
pub fn list_tools(read_only: bool) -> Vec<&'static ToolDef> {
    all_tools().filter(|t| !read_only || !t.is_write()).collect()
}

/// Tool result
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub text: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Error: {}", message),
            is_error: true,
        }
    }
}

/// Executes tool calls against the configured services
pub struct ArrTools {
    config: Arc<Config>,
    radarr: RadarrApi,
    sonarr: SonarrApi,
}

impl ArrTools {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let radarr = RadarrApi::from_config(&config.radarr_config)?;
        let sonarr = SonarrApi::from_config(&config.sonarr_config)?;
        Ok(Self {
            config,
            radarr,
            sonarr,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn radarr(&self) -> &RadarrApi {
        &self.radarr
    }

    pub fn sonarr(&self) -> &SonarrApi {
        &self.sonarr
    }

    pub fn list(&self) -> Vec<&'static ToolDef> {
        list_tools(self.config.read_only)
    }

    /// Execute a tool; failures are reported in the result text, never as protocol errors
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> ToolResult {
        if self.config.read_only && is_write_tool(name) {
            warn!("Refused write tool {} in read-only mode", name);
            return ToolResult::error(format!(
                "Tool '{}' is not available: server is running in read-only mode",
                name
            ));
        }

        if find_tool(name).is_none() {
            return ToolResult::error(format!("Unknown tool: {}", name));
        }

        info!("Executing tool {}", name);
        let args = arguments.unwrap_or_else(|| json!({}));

        let outcome = if defines(radarr::TOOLS, name) {
            radarr::execute(self, name, args).await
        } else if defines(sonarr::TOOLS, name) {
            sonarr::execute(self, name, args).await
        } else {
            shared::execute(self, name, args).await
        };

        match outcome {
            Ok(text) => ToolResult::ok(text),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                ToolResult::error(e)
            }
        }
    }
}

/// Deserialize tool arguments, naming the tool on failure
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| anyhow!("Invalid arguments for {}: {}", tool, e))
}

/// Pretty JSON for tool output
pub(crate) fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Shorten long free text (overviews) on a character boundary
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Case-insensitive substring match used by the title filters
pub(crate) fn title_matches(title: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim) {
        Some(f) if !f.is_empty() => title.to_lowercase().contains(&f.to_lowercase()),
        _ => true,
    }
}
