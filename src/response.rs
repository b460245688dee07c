//! Raw responses and the default response parser.
//!
//! A transport hands back a [`RawResponse`]; a parser turns it into the JSON
//! value a generated method resolves with, or into a rejection.

use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// A response as delivered by a [`Transport`](crate::Transport).
///
/// Keeps the raw body text so parsers (and error reports) can look at exactly
/// what the server sent.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use toapi::RawResponse;
///
/// let response = RawResponse::new(StatusCode::OK, r#"{"id": 1}"#);
/// assert_eq!(response.json().unwrap()["id"], 1);
/// ```
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The raw response body as a string.
    pub body: String,

    /// Time between sending the request and receiving the full body.
    pub latency: Duration,
}

impl RawResponse {
    /// Creates a response with no headers and zero latency.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            latency: Duration::ZERO,
        }
    }

    /// Sets the response headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the measured latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] with the raw body if it is not
    /// valid JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(|e| {
            tracing::error!(
                error = %e,
                status = self.status.as_u16(),
                raw_response = %self.body,
                "Failed to deserialize response"
            );
            Error::DeserializationFailed {
                raw_response: self.body.clone(),
                serde_error: e.to_string(),
                status: self.status,
            }
        })
    }

    /// Returns a header value by name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use toapi::RawResponse;
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", HeaderValue::from_static("application/json"));
    ///
    /// let response = RawResponse::new(StatusCode::OK, "{}").with_headers(headers);
    /// assert_eq!(response.header("Content-Type"), Some("application/json"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// The parser used when neither the route, the `create` call nor the creator
/// configures one.
///
/// * `status <= 200`: the body parsed as JSON.
/// * `200 < status < 400`: `null`, without reading the body.
/// * `status >= 400`: [`Error::Rejected`] carrying the parsed JSON body.
///
/// # Errors
///
/// Rejects statuses of 400 and above, and fails with
/// [`Error::DeserializationFailed`] when a body that must be read is not JSON.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use toapi::{default_parse_response, Error, RawResponse};
///
/// let created = RawResponse::new(StatusCode::CREATED, "ignored");
/// assert_eq!(default_parse_response(created).unwrap(), serde_json::Value::Null);
///
/// let missing = RawResponse::new(StatusCode::NOT_FOUND, r#"{"error":"no such user"}"#);
/// let err = default_parse_response(missing).unwrap_err();
/// assert_eq!(err.rejection().unwrap()["error"], "no such user");
/// ```
pub fn default_parse_response(response: RawResponse) -> Result<Value> {
    let status = response.status.as_u16();
    if status < 400 {
        if status > 200 {
            return Ok(Value::Null);
        }
        return response.json();
    }

    let body = response.json()?;
    if response.status.is_client_error() {
        tracing::error!(status, response = %body, "Client error (4xx)");
    } else {
        tracing::warn!(status, response = %body, "Server error (5xx)");
    }
    Err(Error::Rejected(body))
}
