//! Hook types, per-call overrides and configuration precedence.
//!
//! A setting can come from three layers: the creator's defaults, the
//! [`Overrides`] passed to [`ApiCreator::create`](crate::ApiCreator::create),
//! and the individual [`RouteDescriptor`](crate::RouteDescriptor). Each field is
//! resolved on its own, most specific layer first.

use crate::{HeaderStore, Params, RawResponse, Result, Transport};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Rewrites call parameters before the request is shaped.
pub type TransformRequest = Arc<dyn Fn(Params) -> Params + Send + Sync>;

/// Rewrites a successfully parsed response.
pub type TransformResponse = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Turns a raw response into a parsed result or a rejection.
pub type ParseResponse = Arc<dyn Fn(RawResponse) -> Result<Value> + Send + Sync>;

/// Serializes the remaining parameters of a GET request into a query string.
pub type QueryEncoder = Arc<dyn Fn(&Params) -> String + Send + Sync>;

/// Settings that override the creator's defaults for one
/// [`create`](crate::ApiCreator::create) call.
///
/// Unset fields fall back to the creator. Headers given here are layered on
/// top of the creator's live header store at call time.
///
/// # Examples
///
/// ```
/// use toapi::Overrides;
///
/// let overrides = Overrides::new()
///     .base_url("http://localhost:8080/v2")
///     .header("x-tenant", "acme")
///     .transform_response(|value| value["data"].clone());
/// assert_eq!(overrides.base_url.as_deref(), Some("http://localhost:8080/v2"));
/// ```
#[derive(Clone, Default)]
pub struct Overrides {
    /// Base URL used instead of the creator's.
    pub base_url: Option<String>,
    /// Transport used instead of the creator's.
    pub transport: Option<Arc<dyn Transport>>,
    /// Extra headers; [`ApiCreator::clone_with`](crate::ApiCreator::clone_with)
    /// uses them as the new creator's headers instead.
    pub headers: Option<HeaderStore>,
    /// Response parser used instead of the creator's.
    pub parse_response: Option<ParseResponse>,
    /// Request transform used instead of the creator's.
    pub transform_request: Option<TransformRequest>,
    /// Response transform used instead of the creator's.
    pub transform_response: Option<TransformResponse>,
    /// Query encoder used instead of the creator's.
    pub query_encoder: Option<QueryEncoder>,
}

impl Overrides {
    /// Creates an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Adds a header to the override layer.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HeaderStore::new)
            .add(name, value);
        self
    }

    /// Overrides the response parser.
    pub fn parse_response<F>(mut self, parse: F) -> Self
    where
        F: Fn(RawResponse) -> Result<Value> + Send + Sync + 'static,
    {
        self.parse_response = Some(Arc::new(parse));
        self
    }

    /// Overrides the request transform.
    pub fn transform_request<F>(mut self, transform: F) -> Self
    where
        F: Fn(Params) -> Params + Send + Sync + 'static,
    {
        self.transform_request = Some(Arc::new(transform));
        self
    }

    /// Overrides the response transform.
    pub fn transform_response<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform_response = Some(Arc::new(transform));
        self
    }

    /// Overrides the query encoder.
    pub fn query_encoder<F>(mut self, encode: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        self.query_encoder = Some(Arc::new(encode));
        self
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.is_some())
            .field("headers", &self.headers)
            .field("parse_response", &self.parse_response.is_some())
            .field("transform_request", &self.transform_request.is_some())
            .field("transform_response", &self.transform_response.is_some())
            .field("query_encoder", &self.query_encoder.is_some())
            .finish()
    }
}

/// Picks the most specific setting for a field the creator always has.
pub fn resolve<'a, T: ?Sized>(route: Option<&'a T>, call: Option<&'a T>, creator: &'a T) -> &'a T {
    route.or(call).unwrap_or(creator)
}

/// Picks the most specific setting for a field that may be unset everywhere.
pub fn resolve_optional<'a, T: ?Sized>(
    route: Option<&'a T>,
    call: Option<&'a T>,
    creator: Option<&'a T>,
) -> Option<&'a T> {
    route.or(call).or(creator)
}
