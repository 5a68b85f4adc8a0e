//! MCP (Model Context Protocol) module

pub mod server;
pub mod sse;
pub mod stdio;
pub mod types;

pub use server::{McpServer, PROTOCOL_VERSION, SERVER_NAME};
pub use sse::SseServer;
pub use stdio::{is_header_line, parse_content_length, TransportMode, MAX_HEADER_COUNT};
