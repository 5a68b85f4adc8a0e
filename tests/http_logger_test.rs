//! Tests for http_logger module

use radarr_sonarr_mcp::http_logger::{mask_secret, truncate_utf8_safe};

#[test]
fn test_truncate_utf8_safe_ascii() {
    let s = "Hello, World!";
    assert_eq!(truncate_utf8_safe(s, 100), s);
    assert!(truncate_utf8_safe(s, 5).starts_with("Hello..."));
}

#[test]
fn test_truncate_utf8_safe_multibyte() {
    // "é" is two bytes; a cut inside it moves back to the boundary
    let s = "ééééé";
    let truncated = truncate_utf8_safe(s, 3);
    assert!(truncated.starts_with("é..."));
    assert!(truncated.contains("[truncated, total 10 bytes]"));
}

#[test]
fn test_mask_secret_api_key() {
    assert_eq!(mask_secret("0123456789abcdef"), "0123...cdef");
    assert_eq!(mask_secret("short"), "****");
    assert_eq!(mask_secret(""), "****");
}

#[test]
fn test_mask_secret_bearer() {
    assert_eq!(mask_secret("Bearer abcdefghijklmnop"), "Bearer abcd...mnop");
    assert_eq!(mask_secret("Bearer short"), "Bearer ****");
}
