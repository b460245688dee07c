//! The injectable transport that performs the actual network call.
//!
//! Generated methods never talk to the network themselves: they hand a
//! [`TransportRequest`] to a [`Transport`] and parse what comes back. The
//! default transport is [`ReqwestTransport`]; tests and embedders can plug in
//! anything else, including a plain async closure via [`transport_fn`].

use crate::shaper::to_query_string;
use crate::{Error, HeaderStore, Params, RawResponse, Result};
use futures::future::{BoxFuture, FutureExt};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::Method;
use std::fmt;
use std::future::Future;
use std::time::Instant;

/// The body handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Body already serialized to text (JSON content types).
    Text(String),
    /// The remaining parameters, passed through unserialized because the
    /// content type is not JSON.
    Params(Params),
}

impl RequestBody {
    /// Returns the text body, if the body was serialized.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestBody::Text(text) => Some(text),
            RequestBody::Params(_) => None,
        }
    }
}

/// Everything a transport needs to perform one call.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// The full URL.
    pub url: String,
    /// The HTTP method.
    pub method: Method,
    /// Outgoing headers, in their configured casing.
    pub headers: HeaderStore,
    /// The request body, `None` for bodyless requests.
    pub body: Option<RequestBody>,
}

/// Performs one HTTP exchange.
///
/// Failures are returned as-is to the caller of the generated method; nothing
/// is retried.
pub trait Transport: Send + Sync {
    /// Sends the request and resolves with the raw response.
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<RawResponse>>;
}

/// A [`Transport`] backed by an async closure. See [`transport_fn`].
pub struct FnTransport<F> {
    send_fn: F,
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(TransportRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawResponse>> + Send + 'static,
{
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<RawResponse>> {
        (self.send_fn)(request).boxed()
    }
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransport(..)")
    }
}

/// Wraps an async closure as a [`Transport`].
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use toapi::{transport_fn, Error, RawResponse};
///
/// let echo = transport_fn(|request| async move {
///     Ok::<_, Error>(RawResponse::new(StatusCode::OK, format!("{:?}", request.url)))
/// });
/// ```
pub fn transport_fn<F, Fut>(send_fn: F) -> FnTransport<F>
where
    F: Fn(TransportRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawResponse>> + Send + 'static,
{
    FnTransport { send_fn }
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The default transport, built on a shared `reqwest` client.
///
/// Text bodies are sent verbatim. Unserialized parameter bodies are sent
/// form-urlencoded with the same encoding as GET query strings, so nested
/// values go out as percent-encoded JSON text. A form content type is added
/// when the request has none.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the client cannot be built.
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }

    /// Creates a transport around an existing `reqwest` client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<RawResponse>> {
        let http_client = self.http_client.clone();
        async move {
            let TransportRequest {
                url,
                method,
                headers,
                body,
            } = request;

            let mut header_map = headers.to_header_map()?;
            let body = match body {
                Some(RequestBody::Text(text)) => Some(text),
                Some(RequestBody::Params(params)) => {
                    if !header_map.contains_key(CONTENT_TYPE) {
                        header_map.insert(
                            CONTENT_TYPE,
                            HeaderValue::from_static(FORM_CONTENT_TYPE),
                        );
                    }
                    Some(to_query_string(&params))
                }
                None => None,
            };

            let mut builder = http_client
                .request(method, url.as_str())
                .headers(header_map);
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let start_time = Instant::now();
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await?;

            Ok(RawResponse {
                status,
                headers,
                body,
                latency: start_time.elapsed(),
            })
        }
        .boxed()
    }
}
