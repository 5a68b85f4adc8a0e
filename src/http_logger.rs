//! Optional trace file of Radarr/Sonarr HTTP traffic
//!
//! Enabled by `ARR_HTTP_LOG` (`1`, `true`, `yes`, `on`). Entries are appended
//! to `arr_http.log` in `ARR_HTTP_LOG_DIR`, default `./logs`. API keys and
//! other credentials are masked.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use tracing::warn;

use crate::config::is_truthy;

const ENV_HTTP_LOG: &str = "ARR_HTTP_LOG";
const ENV_HTTP_LOG_DIR: &str = "ARR_HTTP_LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE_NAME: &str = "arr_http.log";

/// Bodies longer than this are cut in the trace (10KB)
const MAX_TRACED_BODY: usize = 10_000;

const MASKED_HEADERS: &[&str] = &[
    "x-api-key",
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
];

/// Serializes appends from concurrent requests
static FILE_LOCK: Mutex<()> = Mutex::new(());

pub fn is_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var(ENV_HTTP_LOG).is_ok_and(|v| is_truthy(&v)))
}

/// One traced request, completed by [`HttpTrace::finished`] or [`HttpTrace::failed`]
pub struct HttpTrace {
    started: String,
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl HttpTrace {
    /// `None` unless tracing is enabled
    pub fn start(method: &str, url: &str, api_key: &str, body: Option<&str>) -> Option<Self> {
        is_enabled().then(|| Self::new(method, url, api_key, body))
    }

    fn new(method: &str, url: &str, api_key: &str, body: Option<&str>) -> Self {
        Self {
            started: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            method: method.to_string(),
            url: url.to_string(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Api-Key".to_string(), api_key.to_string()),
            ],
            body: body.map(str::to_string),
        }
    }

    pub fn finished(self, status: u16, headers: Vec<(String, String)>, body: &str, elapsed_ms: u64) {
        let mut entry = self.render_request();
        let _ = writeln!(entry, "\n--- Response {} ({}ms) ---", status, elapsed_ms);
        push_headers(&mut entry, &headers);
        if !body.is_empty() {
            let _ = writeln!(entry, "\n{}", format_body(body));
        }
        append(entry);
    }

    pub fn failed(self, error: &str, elapsed_ms: u64) {
        let mut entry = self.render_request();
        let _ = writeln!(entry, "\n--- Failed ({}ms) ---\n{}", elapsed_ms, error);
        append(entry);
    }

    fn render_request(&self) -> String {
        let rule = "=".repeat(80);
        let mut entry = format!(
            "{rule}\n[{}] {} {}\n{rule}\n",
            self.started, self.method, self.url
        );
        push_headers(&mut entry, &self.headers);
        if let Some(body) = &self.body {
            let _ = writeln!(entry, "\n{}", format_body(body));
        }
        entry
    }
}

fn push_headers(entry: &mut String, headers: &[(String, String)]) {
    for (name, value) in headers {
        let shown = if is_masked_header(name) {
            mask_secret(value)
        } else {
            value.clone()
        };
        let _ = writeln!(entry, "{}: {}", name, shown);
    }
}

fn append(mut entry: String) {
    entry.push('\n');
    let dir = std::env::var(ENV_HTTP_LOG_DIR)
        .ok()
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));

    let _lock = FILE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let result = fs::create_dir_all(&dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE_NAME))?
            .write_all(entry.as_bytes())
    });
    if let Err(e) = result {
        warn!("Cannot write HTTP trace to {}: {}", dir.display(), e);
    }
}

fn is_masked_header(name: &str) -> bool {
    MASKED_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Keep the first and last four characters of secrets longer than eight
pub fn mask_secret(value: &str) -> String {
    let (scheme, secret) = match value.strip_prefix("Bearer ") {
        Some(token) => ("Bearer ", token),
        None => ("", value),
    };
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return format!("{}****", scheme);
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}...{}", scheme, head, tail)
}

/// Pretty-print JSON bodies; anything else is traced as is
fn format_body(body: &str) -> String {
    let pretty = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok());
    truncate_utf8_safe(pretty.as_deref().unwrap_or(body), MAX_TRACED_BODY)
}

/// Cut at a UTF-8 character boundary, noting the original length
pub fn truncate_utf8_safe(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let end = (0..=max_len)
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}...\n[truncated, total {} bytes]", &s[..end], s.len())
}

/// Response headers as name/value text pairs
pub fn response_headers(response: &reqwest::Response) -> Vec<(String, String)> {
    response
        .headers()
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>");
            (name.as_str().to_string(), value.to_string())
        })
        .collect()
}
