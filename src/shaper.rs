//! Request shaping: from one flat parameter object to a concrete request.
//!
//! [`shape_request`] binds `:name` path tokens from the parameters, then
//! sends whatever is left either as a query string (GET) or as the request
//! body (any other verb). It never performs I/O and never fails.

use crate::config::{QueryEncoder, TransformRequest};
use crate::RouteDescriptor;
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use url::Url;

/// Call parameters: a flat JSON object.
pub type Params = Map<String, Value>;

/// Path tokens: `:` followed by a letter, then letters, digits or hyphens.
///
/// Requiring a leading letter keeps ports (`host:8080`) out.
static PATH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(?<name>[A-Za-z][A-Za-z0-9-]*)").expect("a valid regex"));

/// Characters escaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Stand-in for a path parameter missing from the call parameters.
const MISSING_PARAM: &str = "undefined";

/// A shaped request, produced fresh for every call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTriple {
    /// The full URL, path parameters bound and query string appended.
    pub url: String,
    /// The HTTP method.
    pub method: Method,
    /// Remaining parameters of a non-GET request, not yet serialized.
    pub body: Option<Params>,
}

/// Shapes the request for one call of `route`.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use serde_json::json;
/// use toapi::{shaper::{default_query_encoder, shape_request}, RouteDescriptor};
///
/// let route = RouteDescriptor::from("GET /:idOnceAgain/:id");
/// let params = json!({ "id": "v1", "idOnceAgain": "v2", "anotherId": "v3" });
/// let encoder = default_query_encoder();
///
/// let request = shape_request(
///     params.as_object().unwrap().clone(),
///     &route,
///     "http://api/users/?foo=bar",
///     None,
///     &encoder,
/// );
/// assert_eq!(request.url, "http://api/users/v2/v1?foo=bar&anotherId=v3");
/// assert_eq!(request.method, Method::GET);
/// assert_eq!(request.body, None);
/// ```
pub fn shape_request(
    params: Params,
    route: &RouteDescriptor,
    base_url: &str,
    transform_request: Option<&TransformRequest>,
    query_encoder: &QueryEncoder,
) -> RequestTriple {
    let mut params = match transform_request {
        Some(transform) => transform(params),
        None => params,
    };

    let (base, base_query) = split_base_query(base_url);
    let mut url = join_path(base, &route.path);

    let names = token_names(&url);
    for name in &names {
        let value = params
            .get(name.as_str())
            .map_or_else(|| MISSING_PARAM.to_string(), path_value);
        url = url.replace(&format!(":{}", name), &value);
    }
    url.push_str(base_query);

    for name in &names {
        params.shift_remove(name.as_str());
    }

    let is_get = route.method == Method::GET;
    let body = if params.is_empty() {
        None
    } else if is_get {
        let separator = if url.contains('?') { '&' } else { '?' };
        url.push(separator);
        url.push_str(&query_encoder(&params));
        None
    } else {
        Some(params)
    };

    RequestTriple {
        url,
        method: route.method.clone(),
        body,
    }
}

/// Splits a base URL into the part before its query string and the query
/// string itself (starting at `?`, or empty).
///
/// Absolute URLs are checked with the `url` parser; anything else is split at
/// its first literal `?`.
fn split_base_query(base_url: &str) -> (&str, &str) {
    let has_query = match Url::parse(base_url) {
        Ok(parsed) => parsed.query().is_some_and(|query| !query.is_empty()),
        Err(_) => true,
    };
    match base_url.find('?') {
        Some(index) if has_query => base_url.split_at(index),
        _ => (base_url, ""),
    }
}

fn join_path(base: &str, path: &str) -> String {
    let mut url = base.strip_suffix('/').unwrap_or(base).to_string();
    if !path.is_empty() && path != "/" {
        url.push('/');
        url.push_str(path.trim_start_matches('/'));
    }
    url
}

/// Distinct token names, longest first, so that `:id` can never eat the
/// start of `:idOnceAgain`.
fn token_names(url: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PATH_TOKEN.captures_iter(url) {
        if let Some(name) = caps.name("name") {
            if !names.iter().any(|known| known == name.as_str()) {
                names.push(name.as_str().to_string());
            }
        }
    }
    // stable sort keeps first-seen order among equal lengths
    names.sort_by(|a, b| b.len().cmp(&a.len()));
    names
}

/// Path segments take strings verbatim and everything else as JSON text.
fn path_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Encodes parameters as `key=value` pairs joined by `&`.
///
/// Non-string values are JSON-stringified first; keys and values are
/// percent-encoded like `encodeURIComponent`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use toapi::shaper::to_query_string;
///
/// let params = json!({ "where": { "email": "bla@bla.com" }, "limit": 10 });
/// assert_eq!(
///     to_query_string(params.as_object().unwrap()),
///     "where=%7B%22email%22%3A%22bla%40bla.com%22%7D&limit=10",
/// );
/// ```
pub fn to_query_string(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!(
                "{}={}",
                utf8_percent_encode(key, URI_COMPONENT),
                utf8_percent_encode(&value, URI_COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// The default [`QueryEncoder`], wrapping [`to_query_string`].
pub fn default_query_encoder() -> QueryEncoder {
    std::sync::Arc::new(to_query_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap_or_default()
    }

    fn shape(route: &str, base_url: &str, value: Value) -> RequestTriple {
        shape_request(
            params(value),
            &RouteDescriptor::from(route),
            base_url,
            None,
            &default_query_encoder(),
        )
    }

    #[test]
    fn test_longest_token_first() {
        let request = shape(
            "GET /:idOnceAgain/:id",
            "http://api/users/",
            json!({ "id": "value1", "idOnceAgain": "value2", "anotherId": "value3" }),
        );
        assert_eq!(request.url, "http://api/users/value2/value1?anotherId=value3");

        let request = shape(
            "GET /:id/:idOnceAgain",
            "http://api/users/",
            json!({ "id": "value1", "idOnceAgain": "value2" }),
        );
        assert_eq!(request.url, "http://api/users/value1/value2");
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_base_query_is_preserved_and_joined() {
        let request = shape(
            "GET /:idOnceAgain/:id",
            "http://api/users?foo=bar",
            json!({ "id": "v1", "idOnceAgain": "v2", "anotherId": "value3" }),
        );
        assert_eq!(request.url, "http://api/users/v2/v1?foo=bar&anotherId=value3");
    }

    #[test]
    fn test_base_query_on_relative_base() {
        let request = shape("GET /:id", "/api/users/?token=abc", json!({ "id": 7 }));
        assert_eq!(request.url, "/api/users/7?token=abc");
    }

    #[test]
    fn test_base_query_is_never_substituted() {
        let request = shape("GET /:id", "http://api/users?at=a:id", json!({ "id": "1" }));
        assert_eq!(request.url, "http://api/users/1?at=a:id");
    }

    #[test]
    fn test_port_is_not_a_token() {
        let request = shape("GET /:id", "http://127.0.0.1:8080/users", json!({ "id": "x" }));
        assert_eq!(request.url, "http://127.0.0.1:8080/users/x");
    }

    #[test]
    fn test_empty_and_root_paths_add_nothing() {
        let request = shape("POST /", "http://api/users/", json!({ "email": "a@b.c" }));
        assert_eq!(request.url, "http://api/users");
        assert_eq!(request.body, Some(params(json!({ "email": "a@b.c" }))));

        let request = shape("GET", "http://api/users", json!({}));
        assert_eq!(request.url, "http://api/users/GET");

        let route = RouteDescriptor::new("");
        let request = shape_request(
            Params::new(),
            &route,
            "http://api/users/",
            None,
            &default_query_encoder(),
        );
        assert_eq!(request.url, "http://api/users");
    }

    #[test]
    fn test_path_without_leading_slash() {
        let request = shape("GET users/:id", "http://api", json!({ "id": "9" }));
        assert_eq!(request.url, "http://api/users/9");
    }

    #[test]
    fn test_non_get_leftovers_become_body() {
        let request = shape(
            "PUT /:id",
            "http://api/users/",
            json!({ "id": "123", "email": "x@y.com" }),
        );
        assert_eq!(request.url, "http://api/users/123");
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.body, Some(params(json!({ "email": "x@y.com" }))));
    }

    #[test]
    fn test_no_leftovers_means_no_body() {
        let request = shape("DELETE /:id", "http://api/users/", json!({ "id": "123" }));
        assert_eq!(request.url, "http://api/users/123");
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_get_query_encodes_json_values() {
        let request = shape(
            "/",
            "http://api/users/",
            json!({ "where": { "email": "bla@bla.com" } }),
        );
        assert_eq!(
            request.url,
            "http://api/users?where=%7B%22email%22%3A%22bla%40bla.com%22%7D"
        );
    }

    #[test]
    fn test_non_string_path_values_and_missing_params() {
        let request = shape("GET /:page/:missing", "http://api", json!({ "page": 2 }));
        assert_eq!(request.url, "http://api/2/undefined");
    }

    #[test]
    fn test_repeated_token_substituted_everywhere() {
        let request = shape("GET /:id/copy/:id", "http://api", json!({ "id": "a" }));
        assert_eq!(request.url, "http://api/a/copy/a");
    }

    #[test]
    fn test_transform_request_runs_first() {
        let transform: TransformRequest = Arc::new(|mut params: Params| {
            if let Some(user_id) = params.shift_remove("userId") {
                params.insert("id".to_string(), user_id);
            }
            params
        });
        let request = shape_request(
            params(json!({ "userId": "42", "q": "rust" })),
            &RouteDescriptor::from("GET /:id"),
            "http://api",
            Some(&transform),
            &default_query_encoder(),
        );
        assert_eq!(request.url, "http://api/42?q=rust");
    }

    #[test]
    fn test_custom_query_encoder() {
        let encoder: QueryEncoder = Arc::new(|params: &Params| {
            params.keys().cloned().collect::<Vec<_>>().join(",")
        });
        let request = shape_request(
            params(json!({ "a": 1, "b": 2 })),
            &RouteDescriptor::from("/"),
            "http://api",
            None,
            &encoder,
        );
        assert_eq!(request.url, "http://api?a,b");
    }

    #[test]
    fn test_shaping_is_deterministic() {
        let input = json!({ "id": "1", "b": [1, 2], "a": "x y" });
        let first = shape("GET /:id", "http://api?k=v", input.clone());
        let second = shape("GET /:id", "http://api?k=v", input);
        assert_eq!(first, second);
        assert_eq!(first.url, "http://api/1?k=v&b=%5B1%2C2%5D&a=x%20y");
    }

    #[test]
    fn test_leftover_params_keep_caller_order() {
        let input = json!({ "id": "1", "b": 1, "c": 2, "a": 3 });

        let request = shape("GET /:id", "http://api", input.clone());
        assert_eq!(request.url, "http://api/1?b=1&c=2&a=3");

        let request = shape("PUT /:id", "http://api", input);
        let keys: Vec<_> = request
            .body
            .as_ref()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_query_string_keeps_unreserved_marks() {
        let query = to_query_string(&params(json!({ "q": "it's (fine)!*~", "k y": "a&b" })));
        assert_eq!(query, "q=it's%20(fine)!*~&k%20y=a%26b");
    }
}
