//! Request and response logging for the product APIs.
//!
//! Method, URL, status and timing are logged at info level; bodies only at
//! trace level and truncated to `PDP_LOG_MAX_BODY` bytes.

use crate::constants;
use tracing::{info, trace};

const DEFAULT_MAX_BODY_LEN: usize = 1000;

/// Logs an outgoing HTTP request with its optional body
pub fn log_request(method: &str, url: &str, body: Option<&str>, max_body_len: usize) {
    info!(target: "pdp::http", "→ {} {}", method.to_uppercase(), url);

    if let Some(body_content) = body {
        trace!(
            target: "pdp::http",
            "Request body: {}",
            truncate_body(body_content, max_body_len)
        );
    }
}

/// Logs an HTTP response with its optional body
pub fn log_response(status: u16, duration_ms: u128, body: Option<&str>, max_body_len: usize) {
    info!(target: "pdp::http", "← {} ({}ms)", status, duration_ms);

    if let Some(body_content) = body {
        trace!(
            target: "pdp::http",
            "Response body: {}",
            truncate_body(body_content, max_body_len)
        );
    }
}

/// Cuts `body` to at most `max_len` bytes on a character boundary, marking
/// the cut.
#[must_use]
pub fn truncate_body(body: &str, max_len: usize) -> String {
    if body.len() <= max_len {
        return body.to_string();
    }
    let mut end = max_len;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{} (truncated at {max_len} bytes)", &body[..end])
}

/// Gets the maximum body length from the `PDP_LOG_MAX_BODY` environment variable
#[must_use]
pub fn get_max_body_len() -> usize {
    std::env::var(constants::ENV_PDP_LOG_MAX_BODY)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_BODY_LEN)
}
