//! Route descriptors: what one generated API method calls.

use crate::config::{ParseResponse, TransformRequest, TransformResponse};
use crate::{Error, HeaderStore, Params, RawResponse, Result};
use http::Method;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Parses an HTTP verb case-insensitively.
///
/// Only `get`, `post`, `put`, `patch`, `delete` and `head` are recognized;
/// anything else falls back to GET.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use toapi::route::parse_verb;
///
/// assert_eq!(parse_verb("Put"), Method::PUT);
/// assert_eq!(parse_verb("options"), Method::GET);
/// ```
pub fn parse_verb(verb: &str) -> Method {
    match verb.to_ascii_lowercase().as_str() {
        "post" => Method::POST,
        "put" => Method::PUT,
        "patch" => Method::PATCH,
        "delete" => Method::DELETE,
        "head" => Method::HEAD,
        _ => Method::GET,
    }
}

/// What a route header function gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct HeaderContext<'a> {
    /// The request body, once shaped. `None` for bodyless requests.
    pub body: Option<&'a Params>,
    /// The parameters the method was called with, before any transform.
    pub params: &'a Params,
}

/// Route-level headers.
#[derive(Clone)]
pub enum RouteHeaders {
    /// A fixed set of headers.
    Static(HeaderStore),
    /// Headers computed for every call, after the body is shaped.
    Dynamic(Arc<dyn Fn(HeaderContext<'_>) -> HeaderStore + Send + Sync>),
}

impl RouteHeaders {
    /// Produces the headers for one call.
    pub fn evaluate(&self, context: HeaderContext<'_>) -> HeaderStore {
        match self {
            RouteHeaders::Static(headers) => headers.clone(),
            RouteHeaders::Dynamic(headers_fn) => headers_fn(context),
        }
    }
}

impl fmt::Debug for RouteHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteHeaders::Static(headers) => f.debug_tuple("Static").field(headers).finish(),
            RouteHeaders::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Configuration for one API method: path template, verb and optional hooks.
///
/// Any hook set here wins over the creator and over
/// [`Overrides`](crate::Overrides).
///
/// # Examples
///
/// ```
/// use http::Method;
/// use toapi::RouteDescriptor;
///
/// let route = RouteDescriptor::new("/:id")
///     .method("put")
///     .header("x-audit", "on");
/// assert_eq!(route.method, Method::PUT);
///
/// // compact form
/// let route: RouteDescriptor = "DELETE /:id".parse().unwrap();
/// assert_eq!(route.method, Method::DELETE);
/// assert_eq!(route.path, "/:id");
/// ```
#[derive(Clone)]
pub struct RouteDescriptor {
    /// The path template, relative to the base URL.
    pub path: String,
    /// The HTTP method.
    pub method: Method,
    /// Route-level headers.
    pub headers: Option<RouteHeaders>,
    /// Route-level request transform.
    pub transform_request: Option<TransformRequest>,
    /// Route-level response transform.
    pub transform_response: Option<TransformResponse>,
    /// Route-level response parser.
    pub parse_response: Option<ParseResponse>,
}

impl RouteDescriptor {
    /// Creates a GET route for the given path template.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            headers: None,
            transform_request: None,
            transform_response: None,
            parse_response: None,
        }
    }

    /// Sets the verb; unrecognized verbs fall back to GET.
    pub fn method(mut self, verb: &str) -> Self {
        self.method = parse_verb(verb);
        self
    }

    /// Adds a static route header.
    ///
    /// Replaces a header function set with [`RouteDescriptor::headers_fn`].
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers = match self.headers.take() {
            Some(RouteHeaders::Static(headers)) => headers,
            _ => HeaderStore::new(),
        };
        headers.add(name, value);
        self.headers = Some(RouteHeaders::Static(headers));
        self
    }

    /// Computes route headers per call from the shaped body and the call
    /// parameters.
    pub fn headers_fn<F>(mut self, headers_fn: F) -> Self
    where
        F: Fn(HeaderContext<'_>) -> HeaderStore + Send + Sync + 'static,
    {
        self.headers = Some(RouteHeaders::Dynamic(Arc::new(headers_fn)));
        self
    }

    /// Sets a route-level request transform.
    pub fn transform_request<F>(mut self, transform: F) -> Self
    where
        F: Fn(Params) -> Params + Send + Sync + 'static,
    {
        self.transform_request = Some(Arc::new(transform));
        self
    }

    /// Sets a route-level response transform.
    pub fn transform_response<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform_response = Some(Arc::new(transform));
        self
    }

    /// Sets a route-level response parser.
    pub fn parse_response<F>(mut self, parse: F) -> Self
    where
        F: Fn(RawResponse) -> Result<Value> + Send + Sync + 'static,
    {
        self.parse_response = Some(Arc::new(parse));
        self
    }

    /// Parses the compact `"METHOD /path"` form.
    ///
    /// A single word is both the verb and the path, so a bare `"/path"` is a
    /// GET to `/path`. Unrecognized verbs fall back to GET.
    pub fn parse_compact(compact: &str) -> Self {
        let mut words = compact.split_whitespace();
        let first = words.next().unwrap_or_default();
        let path = words.next().unwrap_or(first);
        Self::new(path).method(first)
    }
}

impl Default for RouteDescriptor {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("transform_request", &self.transform_request.is_some())
            .field("transform_response", &self.transform_response.is_some())
            .field("parse_response", &self.parse_response.is_some())
            .finish()
    }
}

impl FromStr for RouteDescriptor {
    type Err = std::convert::Infallible;

    fn from_str(compact: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse_compact(compact))
    }
}

impl From<&str> for RouteDescriptor {
    fn from(compact: &str) -> Self {
        Self::parse_compact(compact)
    }
}

impl From<String> for RouteDescriptor {
    fn from(compact: String) -> Self {
        Self::parse_compact(&compact)
    }
}

/// A JSON route entry: either the compact string or an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RouteEntry {
    Compact(String),
    Full {
        #[serde(default)]
        path: String,
        #[serde(default)]
        method: Option<String>,
        #[serde(default)]
        headers: Option<IndexMap<String, String>>,
    },
}

impl From<RouteEntry> for RouteDescriptor {
    fn from(entry: RouteEntry) -> Self {
        match entry {
            RouteEntry::Compact(compact) => Self::parse_compact(&compact),
            RouteEntry::Full {
                path,
                method,
                headers,
            } => {
                let mut route = Self::new(path);
                if let Some(method) = method {
                    route = route.method(&method);
                }
                if let Some(headers) = headers {
                    route.headers = Some(RouteHeaders::Static(headers.into_iter().collect()));
                }
                route
            }
        }
    }
}

/// An ordered map of API method names to route descriptors.
///
/// # Examples
///
/// ```
/// use toapi::RouteMap;
///
/// let routes = RouteMap::from_json(r#"{
///     "find": "/",
///     "create": "POST /",
///     "findById": { "path": "/:id", "headers": { "x-cache": "no" } }
/// }"#).unwrap();
/// assert_eq!(routes.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteMap {
    routes: IndexMap<String, RouteDescriptor>,
}

impl RouteMap {
    /// Creates an empty route map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a route map from a JSON object.
    ///
    /// Hooks cannot be expressed in JSON; attach them to the resulting
    /// descriptors with [`RouteMap::get_mut`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the document is not an object of
    /// compact strings or route objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: IndexMap<String, RouteEntry> = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("Invalid route map: {}", e)))?;
        Ok(entries.into_iter().collect())
    }

    /// Adds or replaces a route.
    pub fn insert(&mut self, name: impl Into<String>, route: impl Into<RouteDescriptor>) {
        self.routes.insert(name.into(), route.into());
    }

    /// Returns a route by method name.
    pub fn get(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.get(name)
    }

    /// Returns a mutable route by method name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut RouteDescriptor> {
        self.routes.get_mut(name)
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if there are no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<N, R> FromIterator<(N, R)> for RouteMap
where
    N: Into<String>,
    R: Into<RouteDescriptor>,
{
    fn from_iter<I: IntoIterator<Item = (N, R)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, route) in iter {
            map.insert(name, route);
        }
        map
    }
}

impl IntoIterator for RouteMap {
    type Item = (String, RouteDescriptor);
    type IntoIter = indexmap::map::IntoIter<String, RouteDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_verb_is_case_insensitive_with_get_fallback() {
        assert_eq!(parse_verb("POST"), Method::POST);
        assert_eq!(parse_verb("patch"), Method::PATCH);
        assert_eq!(parse_verb("Head"), Method::HEAD);
        assert_eq!(parse_verb("trace"), Method::GET);
        assert_eq!(parse_verb(""), Method::GET);
    }

    #[test]
    fn test_compact_forms() {
        let route = RouteDescriptor::parse_compact("PUT /:id");
        assert_eq!((route.method, route.path.as_str()), (Method::PUT, "/:id"));

        let route = RouteDescriptor::parse_compact("  /  ");
        assert_eq!((route.method, route.path.as_str()), (Method::GET, "/"));

        let route = RouteDescriptor::parse_compact("delete");
        assert_eq!((route.method, route.path.as_str()), (Method::DELETE, "delete"));

        let route = RouteDescriptor::parse_compact("FETCH /things");
        assert_eq!((route.method, route.path.as_str()), (Method::GET, "/things"));

        let route = RouteDescriptor::parse_compact("");
        assert_eq!((route.method, route.path.as_str()), (Method::GET, ""));
    }

    #[test]
    fn test_static_headers_accumulate() {
        let route = RouteDescriptor::new("/").header("x-a", "1").header("x-b", "2");
        let params = Params::new();
        let headers = route.headers.unwrap().evaluate(HeaderContext {
            body: None,
            params: &params,
        });
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_dynamic_headers_see_body_and_params() {
        let route = RouteDescriptor::new("/").headers_fn(|ctx| {
            let mut headers = HeaderStore::new();
            headers.add("x-has-body", ctx.body.is_some().to_string());
            headers.add("x-param-count", ctx.params.len().to_string());
            headers
        });
        let params = json!({ "a": 1, "b": 2 }).as_object().cloned().unwrap();
        let headers = route.headers.unwrap().evaluate(HeaderContext {
            body: Some(&params),
            params: &params,
        });
        assert_eq!(headers.get("x-has-body"), Some("true"));
        assert_eq!(headers.get("x-param-count"), Some("2"));
    }

    #[test]
    fn test_route_map_from_json() {
        let routes = RouteMap::from_json(
            r#"{
                "create": "POST /",
                "updateById": { "path": "/:id", "method": "put" },
                "find": { "path": "/", "headers": { "x-cache": "no" } }
            }"#,
        )
        .unwrap();

        let names: Vec<_> = routes.clone().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["create", "updateById", "find"]);
        assert_eq!(routes.get("updateById").unwrap().method, Method::PUT);
        assert_eq!(routes.get("find").unwrap().method, Method::GET);
        assert!(matches!(
            routes.get("find").unwrap().headers,
            Some(RouteHeaders::Static(_))
        ));
    }

    #[test]
    fn test_route_map_from_invalid_json() {
        let err = RouteMap::from_json(r#"{ "broken": 42 }"#).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(RouteMap::from_json("[]").is_err());
    }
}
