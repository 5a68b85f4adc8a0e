//! radarr-sonarr-mcp library - MCP server for Radarr and Sonarr

pub mod arr;
pub mod cli;
pub mod config;
pub mod http_logger;
pub mod mcp;
pub mod resources;
pub mod tools;

// Re-export commonly used types
pub use arr::{ArrClient, ArrError, RadarrApi, Service, SonarrApi};
pub use config::{load_config, save_config, Config, ServerSettings, ServiceConfig, TransportKind};
pub use mcp::{McpServer, SseServer};
pub use tools::{ArrTools, ToolResult, WRITE_TOOLS};
