//! HTTP transport shared by all product APIs.

use crate::constants;
use crate::error::{Error, ErrorContext, ErrorKind};
use crate::logging;
use crate::suggestions;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::time::{Duration, Instant};

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    Content(Vec<u8>),
    /// 204, or a 2xx with an empty body
    NoContent,
}

impl ApiResponse {
    /// Parses the body as JSON; `None` when there is no content.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        match self {
            Self::Content(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            Self::NoContent => Ok(None),
        }
    }
}

/// Installs the process-wide rustls crypto provider. Later calls are no-ops.
pub fn ensure_crypto_provider() {
    #[cfg(not(windows))]
    let _ = rustls::crypto::ring::default_provider().install_default();
    #[cfg(windows)]
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_body_len: usize,
}

impl HttpClient {
    /// Creates a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        ensure_crypto_provider();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pdp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::from(e).with_context("Failed to create HTTP client"))?;
        Ok(Self {
            client,
            max_body_len: logging::get_max_body_len(),
        })
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<ApiResponse, Error> {
        self.send(Method::GET, url, None, params).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn post(
        &self,
        url: &str,
        body: &Value,
        params: &[(&str, String)],
    ) -> Result<ApiResponse, Error> {
        self.send(Method::POST, url, Some(body), params).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn put(
        &self,
        url: &str,
        body: &Value,
        params: &[(&str, String)],
    ) -> Result<ApiResponse, Error> {
        self.send(Method::PUT, url, Some(body), params).await
    }

    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn delete(&self, url: &str, params: &[(&str, String)]) -> Result<ApiResponse, Error> {
        self.send(Method::DELETE, url, None, params).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        params: &[(&str, String)],
    ) -> Result<ApiResponse, Error> {
        let full_url = with_query(url, params);
        let body_text = body.map(serde_json::to_string).transpose()?;

        logging::log_request(
            method.as_str(),
            &full_url,
            body_text.as_deref(),
            self.max_body_len,
        );

        let mut request = self.client.request(method.clone(), &full_url);
        if let Some(text) = body_text {
            request = request
                .header(reqwest::header::CONTENT_TYPE, constants::CONTENT_TYPE_JSON)
                .body(text);
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| network_error(method.as_str(), &full_url, &e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_error(method.as_str(), &full_url, &e))?;
        let text = String::from_utf8_lossy(&bytes);

        logging::log_response(
            status.as_u16(),
            started.elapsed().as_millis(),
            (!text.is_empty()).then_some(text.as_ref()),
            self.max_body_len,
        );

        if !status.is_success() {
            return Err(Error::http_request(
                method.as_str(),
                &full_url,
                status.as_u16(),
                extract_errors(&text),
            ));
        }

        if status == reqwest::StatusCode::NO_CONTENT || bytes.iter().all(u8::is_ascii_whitespace) {
            Ok(ApiResponse::NoContent)
        } else {
            Ok(ApiResponse::Content(bytes.to_vec()))
        }
    }
}

/// Transport failure, with the whole source chain in the message since
/// reqwest keeps the useful part (refused, DNS, timeout) in the sources.
fn network_error(method: &str, url: &str, error: &reqwest::Error) -> Error {
    let mut detail = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    let hint = suggestions::suggest_network_fix(url, &detail.to_lowercase());
    Error::new(
        ErrorKind::HttpRequest,
        format!("{method} {url} failed: {detail}"),
        Some(ErrorContext::new(
            Some(json!({ "method": method, "url": url })),
            Some(Cow::Owned(hint)),
        )),
    )
}

fn with_query(url: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Server-reported error messages from an error response body.
///
/// Looks at `errors`, `messages`, `message` and `error` in that order; each
/// may be a string, a list of strings, or a list of objects with a
/// `message`. Falls back to the raw body.
#[must_use]
pub fn extract_errors(body: &str) -> Vec<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return vec![constants::EMPTY_RESPONSE.to_string()];
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) else {
        return vec![trimmed.to_string()];
    };

    for field in ["errors", "messages", "message", "error"] {
        let found = map.get(field).map(collect_messages).unwrap_or_default();
        if !found.is_empty() {
            return found;
        }
    }
    vec![trimmed.to_string()]
}

fn collect_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(collect_messages).collect(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
