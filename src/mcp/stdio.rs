//! stdio transport: newline-delimited or Content-Length framed JSON-RPC
//!
//! The framing is detected from the first message unless fixed on the
//! command line. Replies use the same framing as the requests.

use anyhow::{anyhow, bail, ensure, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{error, info};

use super::server::McpServer;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransportMode {
    /// `Content-Length` headers, blank line, body
    Lsp,
    /// One JSON message per line
    Line,
}

/// Longest accepted line in Line mode (10MB)
const MAX_LINE_LENGTH: usize = 10 * 1024 * 1024;

/// Longest accepted header line
const MAX_HEADER_LENGTH: usize = 1024;

/// Header lines per message, blank lines before the first header included
pub const MAX_HEADER_COUNT: usize = 100;

/// Largest accepted Content-Length (10MB)
const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Header names that start a Content-Length framed message
pub fn is_header_line(line: &str) -> bool {
    line.split_once(':').is_some_and(|(name, _)| {
        let name = name.trim();
        ["content-length", "content-type"]
            .iter()
            .any(|header| name.eq_ignore_ascii_case(header))
    })
}

/// `Some(n)` for a `Content-Length: n` line, `None` for any other line
pub fn parse_content_length(line: &str) -> Result<Option<usize>> {
    match line.split_once(':') {
        Some((name, value)) if name.trim().eq_ignore_ascii_case("content-length") => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("Invalid Content-Length header: {}", e)),
        _ => Ok(None),
    }
}

/// One line without its terminator; `None` at EOF
async fn read_raw_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    limit: usize,
) -> Result<Option<String>> {
    let mut bytes = Vec::new();
    if reader.read_until(b'\n', &mut bytes).await? == 0 {
        return Ok(None);
    }
    ensure!(
        bytes.len() <= limit,
        "Line of {} bytes exceeds the {} byte limit",
        bytes.len(),
        limit
    );
    let mut line = String::from_utf8(bytes).context("Line is not valid UTF-8")?;
    let end = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(end);
    Ok(Some(line))
}

/// Next non-empty line
async fn read_content_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<String>> {
    while let Some(line) = read_raw_line(reader, MAX_LINE_LENGTH).await? {
        if !line.is_empty() {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

/// Headers up to the blank line, then the body. `first` is a header line
/// already consumed while detecting the framing.
async fn read_framed<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    first: Option<String>,
) -> Result<Option<String>> {
    let mut length = None;
    let mut seen_header = false;
    let mut lines_read = 0;
    let mut pending = first;

    loop {
        let line = match pending.take() {
            Some(line) => line,
            None => match read_raw_line(reader, MAX_HEADER_LENGTH).await? {
                Some(line) => line,
                None => return Ok(None),
            },
        };

        lines_read += 1;
        if lines_read > MAX_HEADER_COUNT {
            bail!(
                "More than {} header or leading blank lines",
                MAX_HEADER_COUNT
            );
        }

        if line.is_empty() {
            if seen_header {
                break;
            }
            continue;
        }
        seen_header = true;
        if let Some(n) = parse_content_length(&line)? {
            length = Some(n);
        }
    }

    let length = length.ok_or_else(|| anyhow!("Message has no Content-Length header"))?;
    if length > MAX_MESSAGE_SIZE {
        // Skip the body so the next frame starts on a header
        tokio::io::copy(&mut (&mut *reader).take(length as u64), &mut tokio::io::sink()).await?;
        bail!(
            "Content-Length {} exceeds the {} byte limit",
            length,
            MAX_MESSAGE_SIZE
        );
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    let message = String::from_utf8(body).context("Message body is not valid UTF-8")?;
    Ok(Some(message))
}

/// Read the next message, detecting the framing from the first one when `mode` is unset
pub async fn read_message<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    mode: &mut Option<TransportMode>,
) -> Result<Option<String>> {
    match *mode {
        Some(TransportMode::Line) => read_content_line(reader).await,
        Some(TransportMode::Lsp) => read_framed(reader, None).await,
        None => {
            let Some(first) = read_content_line(reader).await? else {
                return Ok(None);
            };
            if is_header_line(&first) {
                *mode = Some(TransportMode::Lsp);
                read_framed(reader, Some(first)).await
            } else {
                *mode = Some(TransportMode::Line);
                Ok(Some(first))
            }
        }
    }
}

pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    mode: TransportMode,
    payload: &str,
) -> Result<()> {
    let frame = match mode {
        TransportMode::Line => format!("{}\n", payload),
        TransportMode::Lsp => format!("Content-Length: {}\r\n\r\n{}", payload.len(), payload),
    };
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Serve requests from `reader` until EOF, writing replies to `writer`
pub async fn serve<R, W>(
    server: &McpServer,
    mut reader: R,
    mut writer: W,
    mode: Option<TransportMode>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut mode = mode;

    loop {
        let message = match read_message(&mut reader, &mut mode).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            // A broken stream stays broken; a bad frame only loses that message
            Err(e) if e.downcast_ref::<std::io::Error>().is_some() => return Err(e),
            Err(e) => {
                error!("Dropping malformed message: {:#}", e);
                continue;
            }
        };

        if let Some(reply) = server.handle_message(&message).await {
            write_message(&mut writer, mode.unwrap_or(TransportMode::Line), &reply).await?;
        }
    }

    Ok(())
}

/// Run the MCP server on the process stdin/stdout
pub async fn run(server: &McpServer, mode: Option<TransportMode>) -> Result<()> {
    info!("MCP server started on stdio, waiting for requests...");
    serve(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout(), mode).await?;
    info!("stdin closed, shutting down");
    Ok(())
}
