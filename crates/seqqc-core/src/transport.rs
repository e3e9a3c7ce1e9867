//! Outcome service transport
//!
//! Every exchange with the QC outcomes service is one JSON POST. The trait
//! is the seam between the controls and the network; tests substitute a
//! scripted service.

use crate::error::TransportError;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use seqqc_model::QcConfig;
use serde_json::Value;

/// Marker separating a server error message from its stack trace
const STACK_TRACE_MARKER: &str = " at /";

/// QC outcomes service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OutcomesService: Send + Sync {
    /// POST a JSON body and return the decoded JSON response
    ///
    /// An empty success body decodes to `Value::Null`.
    async fn post_json(&self, body: &Value) -> Result<Value, TransportError>;
}

/// HTTP implementation on `reqwest`
#[derive(Debug, Clone)]
pub struct HttpOutcomesService {
    client: reqwest::Client,
    url: String,
}

impl HttpOutcomesService {
    /// Create a client for the configured outcomes URL
    ///
    /// Responses are never cached; the request timeout comes from the
    /// configuration, or the transport default when unset.
    ///
    /// # Errors
    /// `TransportError::Network` if the client cannot be built.
    pub fn new(config: &QcConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: config.outcomes_url.clone(),
        })
    }

    /// Service URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl OutcomesService for HttpOutcomesService {
    async fn post_json(&self, body: &Value) -> Result<Value, TransportError> {
        tracing::debug!(url = %self.url, "POST QC outcomes request");
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            let message = error_message(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                &text,
            );
            tracing::warn!(status = status.as_u16(), %message, "QC outcomes service error");
            return Err(TransportError::status(status.as_u16(), message));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// User-visible message for a failed response
///
/// The `error` field of a JSON body, trimmed and cut before the stack
/// trace marker; otherwise `"<status> <reason>"`.
#[must_use]
pub fn error_message(status: u16, reason: &str, body: &str) -> String {
    let from_body = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string));
    match from_body {
        Some(error) => strip_stack_trace(error.trim()).to_string(),
        None => format!("{status} {reason}"),
    }
}

/// Text of the first line before the stack trace marker
#[must_use]
pub fn strip_stack_trace(message: &str) -> &str {
    match message.find(STACK_TRACE_MARKER) {
        Some(index) if !message[..index].contains('\n') => &message[..index],
        _ => message,
    }
}
