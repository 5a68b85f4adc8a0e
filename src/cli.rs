//! Command line and environment options

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::config::{
    ServerSettings, DEFAULT_CONFIG_PATH, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TRANSPORT,
};
use crate::mcp::TransportMode;

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum FramingArg {
    Auto,
    Lsp,
    Line,
}

#[derive(Parser, Debug)]
#[command(name = "radarr-sonarr-mcp")]
#[command(about = "MCP server exposing Radarr and Sonarr")]
#[command(version)]
pub struct Args {
    /// MCP transport: sse or stdio
    #[arg(long, env = "MCP_TRANSPORT", default_value = DEFAULT_TRANSPORT)]
    pub transport: String,

    /// Interface address or hostname to listen on (sse)
    #[arg(long, env = "MCP_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on (sse)
    #[arg(long, env = "MCP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// JSON config file; environment variables are used when it does not exist
    #[arg(long, env = "ARR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Message framing for the stdio transport: auto, lsp, line
    #[arg(long, value_enum, default_value = "auto")]
    pub framing: FramingArg,
}

impl Args {
    pub fn settings(&self) -> Result<ServerSettings> {
        ServerSettings::new(&self.transport, &self.host, self.port)
    }

    /// Fixed stdio framing, `None` to detect it from the first message
    pub fn framing_mode(&self) -> Option<TransportMode> {
        match self.framing {
            FramingArg::Auto => None,
            FramingArg::Lsp => Some(TransportMode::Lsp),
            FramingArg::Line => Some(TransportMode::Line),
        }
    }
}
