//! Tests for the MCP dispatcher and stdio framing

use std::sync::Arc;

use radarr_sonarr_mcp::config::{Config, ServiceConfig};
use radarr_sonarr_mcp::mcp::stdio::{self, read_message, write_message};
use radarr_sonarr_mcp::mcp::{
    is_header_line, parse_content_length, McpServer, TransportMode, PROTOCOL_VERSION, SERVER_NAME,
};
use radarr_sonarr_mcp::tools::{ArrTools, WRITE_TOOLS};
use serde_json::{json, Value};
use tokio::io::BufReader;

fn server(read_only: bool) -> McpServer {
    // Empty keys: any call reaching the network layer fails before sending
    let config = Config::new(
        ServiceConfig::new("", "http://127.0.0.1:9"),
        ServiceConfig::new("", "http://127.0.0.1:9"),
    )
    .with_read_only(read_only);
    McpServer::new(Arc::new(ArrTools::new(Arc::new(config)).unwrap()))
}

async fn call(server: &McpServer, request: Value) -> Value {
    let reply = server
        .handle_message(&request.to_string())
        .await
        .expect("request should produce a reply");
    serde_json::from_str(&reply).unwrap()
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    call(
        server,
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        }),
    )
    .await
}

fn tool_names(reply: &Value) -> Vec<String> {
    reply["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect()
}

// Tests for framing helpers

#[test]
fn test_is_header_line() {
    assert!(is_header_line("Content-Length: 10"));
    assert!(is_header_line("content-type: application/json"));
    assert!(!is_header_line("{\"jsonrpc\":\"2.0\"}"));
    assert!(!is_header_line("X-Other: 1"));
}

#[test]
fn test_parse_content_length() {
    assert_eq!(parse_content_length("Content-Length: 42").unwrap(), Some(42));
    assert_eq!(parse_content_length("CONTENT-LENGTH:7").unwrap(), Some(7));
    assert_eq!(parse_content_length("Content-Type: x").unwrap(), None);
    assert!(parse_content_length("Content-Length: abc").is_err());
}

#[tokio::test]
async fn test_read_message_detects_line_mode() {
    let mut reader = BufReader::new(&b"\n{\"a\":1}\n{\"b\":2}\n"[..]);
    let mut mode = None;
    assert_eq!(
        read_message(&mut reader, &mut mode).await.unwrap().as_deref(),
        Some("{\"a\":1}")
    );
    assert_eq!(mode, Some(TransportMode::Line));
    assert_eq!(
        read_message(&mut reader, &mut mode).await.unwrap().as_deref(),
        Some("{\"b\":2}")
    );
    assert_eq!(read_message(&mut reader, &mut mode).await.unwrap(), None);
}

#[tokio::test]
async fn test_read_message_detects_lsp_mode() {
    let mut reader = BufReader::new(&b"Content-Length: 7\r\n\r\n{\"a\":1}"[..]);
    let mut mode = None;
    assert_eq!(
        read_message(&mut reader, &mut mode).await.unwrap().as_deref(),
        Some("{\"a\":1}")
    );
    assert_eq!(mode, Some(TransportMode::Lsp));
}

#[tokio::test]
async fn test_write_message_framing() {
    let mut out = Vec::new();
    write_message(&mut out, TransportMode::Lsp, "{}").await.unwrap();
    assert_eq!(out, b"Content-Length: 2\r\n\r\n{}");

    let mut out = Vec::new();
    write_message(&mut out, TransportMode::Line, "{}").await.unwrap();
    assert_eq!(out, b"{}\n");
}

#[tokio::test]
async fn test_stdio_serve_replies_in_order_and_skips_notifications() {
    let input = concat!(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
        "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
    );
    let mut output = Vec::new();
    stdio::serve(&server(false), BufReader::new(input.as_bytes()), &mut output, None)
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    let replies: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[1]["id"], 2);
}

#[tokio::test]
async fn test_stdio_serve_survives_invalid_utf8_line() {
    let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec();
    input.extend_from_slice(b"\xff\xfe garbage\n");
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");

    let mut output = Vec::new();
    stdio::serve(&server(false), BufReader::new(&input[..]), &mut output, None)
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    let ids: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap()["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn test_stdio_serve_resyncs_after_oversized_frame() {
    let big = "x".repeat(10 * 1024 * 1024 + 1);
    let ping = r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#;
    let input = format!(
        "Content-Length: {}\r\n\r\n{}Content-Length: {}\r\n\r\n{}",
        big.len(),
        big,
        ping.len(),
        ping
    );

    let mut output = Vec::new();
    stdio::serve(&server(false), BufReader::new(input.as_bytes()), &mut output, None)
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    let (_, body) = text.split_once("\r\n\r\n").unwrap();
    let reply: Value = serde_json::from_str(body).unwrap();
    assert_eq!(reply["id"], 7);
}

// Tests for the dispatcher

#[tokio::test]
async fn test_initialize() {
    let reply = call(
        &server(false),
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .await;
    let result = &reply["result"];
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["resources"].is_object());
}

#[tokio::test]
async fn test_initialize_mentions_read_only() {
    let reply = call(
        &server(true),
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}),
    )
    .await;
    assert!(reply["result"]["instructions"]
        .as_str()
        .unwrap()
        .contains("Read-only"));
}

#[tokio::test]
async fn test_notification_has_no_reply() {
    let reply = server(false)
        .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(reply.is_none());
}

#[tokio::test]
async fn test_parse_error() {
    let reply = server(false).handle_message("{not json").await.unwrap();
    let reply: Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(reply["error"]["code"], -32700);
    assert!(reply["id"].is_null());
}

#[tokio::test]
async fn test_wrong_jsonrpc_version() {
    let reply = call(
        &server(false),
        json!({"jsonrpc": "1.0", "id": 3, "method": "ping"}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32600);
    assert_eq!(reply["id"], 3);
}

#[tokio::test]
async fn test_unknown_method() {
    let reply = call(
        &server(false),
        json!({"jsonrpc": "2.0", "id": "x", "method": "prompts/list"}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32601);
    assert_eq!(reply["id"], "x");
}

#[tokio::test]
async fn test_tools_list_includes_write_tools_by_default() {
    let reply = call(
        &server(false),
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
    )
    .await;
    let names = tool_names(&reply);
    for tool in WRITE_TOOLS {
        assert!(names.iter().any(|n| n == tool), "{} missing", tool);
    }
    assert!(names.iter().any(|n| n == "get_radarr_movies"));
    assert!(reply["result"]["tools"][0]["inputSchema"].is_object());
}

#[tokio::test]
async fn test_tools_list_hides_write_tools_in_read_only_mode() {
    let full = tool_names(
        &call(
            &server(false),
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        )
        .await,
    );
    let names = tool_names(
        &call(
            &server(true),
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        )
        .await,
    );
    for tool in WRITE_TOOLS {
        assert!(!names.iter().any(|n| n == tool), "{} should be hidden", tool);
    }
    assert_eq!(names.len(), full.len() - WRITE_TOOLS.len());
    assert!(names.iter().any(|n| n == "get_sonarr_series"));
    assert!(names.iter().any(|n| n == "get_queue"));
}

#[tokio::test]
async fn test_write_tools_blocked_in_read_only_mode() {
    let server = server(true);
    for tool in WRITE_TOOLS {
        let reply = call_tool(&server, tool, json!({})).await;
        let result = &reply["result"];
        assert_eq!(result["isError"], true, "{}", tool);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("read-only mode"), "{}: {}", tool, text);
    }
}

#[tokio::test]
async fn test_read_tool_not_blocked_in_read_only_mode() {
    let reply = call_tool(&server(true), "get_radarr_movies", json!({})).await;
    let text = reply["result"]["content"][0]["text"].as_str().unwrap();
    assert!(!text.contains("read-only mode"));
    assert!(text.contains("API key is not configured"), "{}", text);
}

#[tokio::test]
async fn test_write_tool_not_blocked_without_read_only() {
    let reply = call_tool(&server(false), "delete_radarr_movie", json!({"movieId": 1})).await;
    let text = reply["result"]["content"][0]["text"].as_str().unwrap();
    assert!(!text.contains("read-only mode"));
}

#[tokio::test]
async fn test_unknown_tool_is_tool_error() {
    let reply = call_tool(&server(false), "no_such_tool", json!({})).await;
    assert!(reply.get("error").is_none());
    assert_eq!(reply["result"]["isError"], true);
    assert!(reply["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Unknown tool"));
}

#[tokio::test]
async fn test_tools_call_without_params() {
    let reply = call(
        &server(false),
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call"}),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);
}

#[tokio::test]
async fn test_resources_list() {
    let reply = call(
        &server(false),
        json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}),
    )
    .await;
    let uris: Vec<&str> = reply["result"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert!(uris.contains(&"radarr://movies"));
    assert!(uris.contains(&"sonarr://series"));
}

#[tokio::test]
async fn test_resources_read_unknown_uri() {
    let reply = call(
        &server(false),
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "resources/read",
            "params": {"uri": "lidarr://artists"}
        }),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);
}
