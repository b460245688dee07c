//! Generated APIs and their callable methods.
//!
//! An [`Api`] is what [`ApiCreator::create`](crate::ApiCreator::create)
//! returns: one named [`ApiMethod`] per route. Every call shapes a fresh
//! request, merges headers, performs exactly one transport call and parses the
//! response.

use crate::config::{ParseResponse, QueryEncoder, TransformRequest, TransformResponse};
use crate::route::HeaderContext;
use crate::shaper::{shape_request, RequestTriple};
use crate::transport::{RequestBody, TransportRequest};
use crate::{Error, HeaderStore, Params, Result, RouteDescriptor, Transport};
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// The configuration one method runs with, resolved once when the API is
/// created.
pub(crate) struct MethodConfig {
    pub(crate) base_url: String,
    pub(crate) transport: Arc<dyn Transport>,
    /// The creator's live header store.
    pub(crate) headers: Arc<RwLock<HeaderStore>>,
    /// Headers from the `create` call, layered over the creator's.
    pub(crate) extra_headers: Option<HeaderStore>,
    pub(crate) parse_response: ParseResponse,
    pub(crate) transform_request: Option<TransformRequest>,
    pub(crate) transform_response: Option<TransformResponse>,
    pub(crate) query_encoder: QueryEncoder,
}

/// One generated API method.
///
/// Cheap to clone; clones share configuration and the creator's headers.
///
/// # Examples
///
/// ```no_run
/// use serde_json::json;
/// use toapi::{ApiCreator, Overrides};
///
/// # async fn example() -> Result<(), toapi::Error> {
/// let creator = ApiCreator::builder()
///     .base_url("http://api/users/")
///     .build()?;
/// let users = creator.create([("updateById", "PUT /:id")], Overrides::default());
///
/// let update_by_id = users.method("updateById").unwrap();
/// // PUT http://api/users/123 with body {"email":"x@y.com"}
/// let updated = update_by_id.call(&json!({ "id": "123", "email": "x@y.com" })).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiMethod {
    inner: Arc<ApiMethodInner>,
}

struct ApiMethodInner {
    name: String,
    route: RouteDescriptor,
    config: MethodConfig,
}

impl ApiMethod {
    pub(crate) fn new(name: String, route: RouteDescriptor, config: MethodConfig) -> Self {
        Self {
            inner: Arc::new(ApiMethodInner {
                name,
                route,
                config,
            }),
        }
    }

    /// The method's name, as registered with the creator.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The route this method calls.
    pub fn route(&self) -> &RouteDescriptor {
        &self.inner.route
    }

    /// Calls the method with any parameters that serialize to a JSON object.
    ///
    /// `()` or `null` mean "no parameters".
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `params` is not an object,
    /// and otherwise whatever the transport or the response parser fails with.
    pub async fn call<P>(&self, params: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        self.call_params(to_params(params)?).await
    }

    /// Calls the method and deserializes the result into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`ApiMethod::call`], plus [`Error::UnexpectedResult`] if the
    /// result does not deserialize into `T`.
    pub async fn call_as<T, P>(&self, params: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let value = self.call(params).await?;
        serde_json::from_value(value.clone()).map_err(|e| Error::UnexpectedResult {
            value,
            serde_error: e.to_string(),
        })
    }

    /// Calls the method with an already built parameter object.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and parser rejections unchanged.
    pub async fn call_params(&self, params: Params) -> Result<Value> {
        let ApiMethodInner {
            name,
            route,
            config,
        } = &*self.inner;

        let RequestTriple { url, method, body } = shape_request(
            params.clone(),
            route,
            &config.base_url,
            config.transform_request.as_ref(),
            &config.query_encoder,
        );

        let mut headers = config
            .headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(extra) = &config.extra_headers {
            headers.merge(extra);
        }
        if let Some(route_headers) = &route.headers {
            headers.merge(&route_headers.evaluate(HeaderContext {
                body: body.as_ref(),
                params: &params,
            }));
        }

        let is_json = headers
            .get("content-type")
            .is_some_and(|content_type| content_type.contains("json"));
        let body = match body {
            Some(body) if is_json => Some(RequestBody::Text(
                serde_json::to_string(&body)
                    .map_err(|e| Error::SerializationFailed(e.to_string()))?,
            )),
            Some(body) => Some(RequestBody::Params(body)),
            None => None,
        };

        tracing::debug!(
            api_method = %name,
            method = %method,
            url = %url,
            "Executing API call"
        );

        let request = TransportRequest {
            url,
            method,
            headers: headers.without_empty(),
            body,
        };
        let response = config.transport.send(request).await.map_err(|e| {
            tracing::warn!(api_method = %name, error = %e, "Transport failed");
            e
        })?;

        tracing::info!(
            api_method = %name,
            status = response.status.as_u16(),
            latency_ms = response.latency.as_millis(),
            "Received HTTP response"
        );

        // rejections skip the response transform
        let parsed = (config.parse_response)(response)?;
        Ok(match &config.transform_response {
            Some(transform) => transform(parsed),
            None => parsed,
        })
    }
}

impl fmt::Debug for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiMethod")
            .field("name", &self.inner.name)
            .field("route", &self.inner.route)
            .field("base_url", &self.inner.config.base_url)
            .finish()
    }
}

fn to_params<P>(params: &P) -> Result<Params>
where
    P: Serialize + ?Sized,
{
    match serde_json::to_value(params) {
        Ok(Value::Object(params)) => Ok(params),
        Ok(Value::Null) => Ok(Params::new()),
        Ok(other) => Err(Error::SerializationFailed(format!(
            "Parameters must serialize to a JSON object, got {}",
            other
        ))),
        Err(e) => Err(Error::SerializationFailed(e.to_string())),
    }
}

/// A generated API: named methods, in registration order.
///
/// # Examples
///
/// ```no_run
/// use serde_json::json;
/// use toapi::{ApiCreator, Overrides};
///
/// # async fn example() -> Result<(), toapi::Error> {
/// let creator = ApiCreator::builder().base_url("http://api/users").build()?;
/// let users = creator.create(
///     [("find", "/"), ("findById", "GET /:id"), ("create", "POST /")],
///     Overrides::default(),
/// );
///
/// let found = users.call("find", &json!({ "where": { "active": true } })).await?;
/// let user = users.call("findById", &json!({ "id": 42 })).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Api {
    methods: IndexMap<String, ApiMethod>,
}

impl Api {
    pub(crate) fn insert(&mut self, method: ApiMethod) {
        self.methods.insert(method.name().to_string(), method);
    }

    /// Returns a method by name.
    pub fn method(&self, name: &str) -> Option<&ApiMethod> {
        self.methods.get(name)
    }

    /// Calls a method by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMethod`] if no route was registered under
    /// `name`, and otherwise whatever [`ApiMethod::call`] fails with.
    pub async fn call<P>(&self, name: &str, params: &P) -> Result<Value>
    where
        P: Serialize + ?Sized,
    {
        let method = self
            .method(name)
            .ok_or_else(|| Error::UnknownMethod(name.to_string()))?;
        method.call(params).await
    }

    /// Method names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// All methods, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ApiMethod> {
        self.methods.values()
    }

    /// Number of methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if the API has no methods.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_params_accepts_objects_and_null() {
        let params = to_params(&json!({ "id": 1 })).unwrap();
        assert_eq!(params.get("id"), Some(&json!(1)));
        assert!(to_params(&()).unwrap().is_empty());
        assert!(to_params(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_to_params_rejects_non_objects() {
        assert!(matches!(to_params(&[1, 2]), Err(Error::SerializationFailed(_))));
        assert!(matches!(to_params("id"), Err(Error::SerializationFailed(_))));
    }

    #[derive(Serialize)]
    struct UpdateUser<'a> {
        id: &'a str,
        email: &'a str,
    }

    #[test]
    fn test_to_params_from_struct_keeps_field_order() {
        let params = to_params(&UpdateUser {
            id: "123",
            email: "x@y.com",
        })
        .unwrap();
        let keys: Vec<_> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "email"]);
    }
}
