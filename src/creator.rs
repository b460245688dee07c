//! API creator: holds the default configuration and builds [`Api`]s.
//!
//! The [`ApiCreator`] type is the main entry point. Use
//! [`ApiCreatorBuilder`] to configure one, then call
//! [`create`](ApiCreator::create) with a route map.

use crate::api::{ApiMethod, MethodConfig};
use crate::config::{
    resolve, resolve_optional, Overrides, ParseResponse, QueryEncoder, TransformRequest,
    TransformResponse,
};
use crate::headers::validate;
use crate::response::default_parse_response;
use crate::shaper::default_query_encoder;
use crate::transport::ReqwestTransport;
use crate::{Api, HeaderStore, Params, RawResponse, Result, RouteDescriptor, Transport};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "/";

/// Creates API clients from route descriptors.
///
/// The creator owns the default configuration and a header store. That store
/// is shared by reference with every [`Api`] the creator produces, so
/// [`add_header`](ApiCreator::add_header) and
/// [`remove_header`](ApiCreator::remove_header) affect all later calls,
/// including calls on APIs created earlier.
///
/// Cloning is cheap and the clone shares the same header store. Use
/// [`clone_with`](ApiCreator::clone_with) for an independent creator.
///
/// # Examples
///
/// ```no_run
/// use serde_json::json;
/// use toapi::{ApiCreator, Overrides, RouteDescriptor};
///
/// # async fn example() -> Result<(), toapi::Error> {
/// let creator = ApiCreator::builder()
///     .base_url("https://api.example.com/users")
///     .header("x-client", "docs")?
///     .build()?;
///
/// let users = creator.create(
///     [
///         ("create", RouteDescriptor::from("POST /")),
///         ("updateById", RouteDescriptor::from("PUT /:id")),
///         ("findById", RouteDescriptor::new("/:id").header("x-cache", "no")),
///     ],
///     Overrides::default(),
/// );
///
/// creator.add_header("Authorization", "Bearer token");
/// let user = users.call("findById", &json!({ "id": 7 })).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiCreator {
    inner: Arc<CreatorDefaults>,
    headers: Arc<RwLock<HeaderStore>>,
}

struct CreatorDefaults {
    base_url: String,
    transport: Arc<dyn Transport>,
    parse_response: ParseResponse,
    transform_request: Option<TransformRequest>,
    transform_response: Option<TransformResponse>,
    query_encoder: QueryEncoder,
}

impl ApiCreator {
    /// Creates a new `ApiCreatorBuilder`.
    pub fn builder() -> ApiCreatorBuilder {
        ApiCreatorBuilder::new()
    }

    /// Creates a creator with every setting at its default.
    ///
    /// # Errors
    ///
    /// Returns an error if the default transport cannot be built.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Builds an [`Api`] with one method per route.
    ///
    /// Each route's settings are resolved field by field: the route itself,
    /// then `overrides`, then this creator.
    pub fn create<I, N, R>(&self, routes: I, overrides: Overrides) -> Api
    where
        I: IntoIterator<Item = (N, R)>,
        N: Into<String>,
        R: Into<RouteDescriptor>,
    {
        let defaults = &*self.inner;
        let mut api = Api::default();

        for (name, route) in routes {
            let name = name.into();
            let route = route.into();

            let config = MethodConfig {
                base_url: resolve(None, overrides.base_url.as_ref(), &defaults.base_url).clone(),
                transport: resolve(None, overrides.transport.as_ref(), &defaults.transport)
                    .clone(),
                headers: Arc::clone(&self.headers),
                extra_headers: overrides.headers.clone(),
                parse_response: resolve(
                    route.parse_response.as_ref(),
                    overrides.parse_response.as_ref(),
                    &defaults.parse_response,
                )
                .clone(),
                transform_request: resolve_optional(
                    route.transform_request.as_ref(),
                    overrides.transform_request.as_ref(),
                    defaults.transform_request.as_ref(),
                )
                .cloned(),
                transform_response: resolve_optional(
                    route.transform_response.as_ref(),
                    overrides.transform_response.as_ref(),
                    defaults.transform_response.as_ref(),
                )
                .cloned(),
                query_encoder: resolve(
                    None,
                    overrides.query_encoder.as_ref(),
                    &defaults.query_encoder,
                )
                .clone(),
            };

            tracing::debug!(
                api_method = %name,
                method = %route.method,
                path = %route.path,
                base_url = %config.base_url,
                "Registered API method"
            );

            api.insert(ApiMethod::new(name, route, config));
        }

        api
    }

    /// Creates a new, independent creator from this one.
    ///
    /// Settings in `overrides` replace this creator's. Override headers are
    /// merged over the default header set; without them the new creator gets
    /// a copy of this creator's current headers. Later header changes on
    /// either creator do not affect the other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if an
    /// override header is not valid HTTP.
    pub fn clone_with(&self, overrides: Overrides) -> Result<ApiCreator> {
        let defaults = &*self.inner;

        let headers = match overrides.headers {
            Some(headers) => {
                for (name, value) in headers.iter() {
                    validate(name, value)?;
                }
                HeaderStore::with_defaults(headers.iter())
            }
            None => self.headers(),
        };

        Ok(ApiCreator {
            inner: Arc::new(CreatorDefaults {
                base_url: overrides
                    .base_url
                    .unwrap_or_else(|| defaults.base_url.clone()),
                transport: overrides
                    .transport
                    .unwrap_or_else(|| Arc::clone(&defaults.transport)),
                parse_response: overrides
                    .parse_response
                    .unwrap_or_else(|| Arc::clone(&defaults.parse_response)),
                transform_request: overrides
                    .transform_request
                    .or_else(|| defaults.transform_request.clone()),
                transform_response: overrides
                    .transform_response
                    .or_else(|| defaults.transform_response.clone()),
                query_encoder: overrides
                    .query_encoder
                    .unwrap_or_else(|| Arc::clone(&defaults.query_encoder)),
            }),
            headers: Arc::new(RwLock::new(headers)),
        })
    }

    /// Sets a header for all later calls, ignoring the case of `name`.
    ///
    /// The name and value are not checked here; an invalid header fails each
    /// later call with [`Error::Configuration`](crate::Error::Configuration).
    /// Use [`try_add_header`](ApiCreator::try_add_header) to check up front.
    pub fn add_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(name, value);
    }

    /// Sets a header for all later calls after checking it is valid HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if the
    /// name or value is invalid; the store is left unchanged.
    pub fn try_add_header(&self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        validate(name.as_ref(), value.as_ref())?;
        self.add_header(name.as_ref(), value.as_ref());
        Ok(())
    }

    /// Removes a header for all later calls, ignoring case.
    ///
    /// Removing `content-type` makes later requests go out without one and
    /// with their body unserialized.
    pub fn remove_header(&self, name: &str) {
        self.headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    /// Returns the current value of a header, ignoring case.
    pub fn get_header(&self, name: &str) -> Option<String> {
        self.headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(str::to_string)
    }

    /// A snapshot of the current headers.
    pub fn headers(&self) -> HeaderStore {
        self.headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The default base URL.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }
}

impl fmt::Debug for ApiCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCreator")
            .field("base_url", &self.inner.base_url)
            .field("headers", &self.headers())
            .field("transform_request", &self.inner.transform_request.is_some())
            .field("transform_response", &self.inner.transform_response.is_some())
            .finish()
    }
}

/// Builder for configuring and creating an [`ApiCreator`].
///
/// Every setting is optional:
///
/// | setting | default |
/// |---|---|
/// | base URL | `/` |
/// | transport | [`ReqwestTransport`] |
/// | headers | `Accept` and `Content-Type` set to `application/json` |
/// | response parser | [`default_parse_response`] |
/// | request / response transforms | none |
/// | query encoder | [`to_query_string`](crate::shaper::to_query_string) |
///
/// # Examples
///
/// ```
/// use toapi::ApiCreatorBuilder;
///
/// # fn example() -> Result<(), toapi::Error> {
/// let creator = ApiCreatorBuilder::new()
///     .base_url("http://localhost:3000/api")
///     .header("User-Agent", "my-app/1.0")?
///     .transform_response(|value| value["data"].clone())
///     .build()?;
/// assert_eq!(creator.get_header("user-agent").as_deref(), Some("my-app/1.0"));
/// # Ok(())
/// # }
/// ```
pub struct ApiCreatorBuilder {
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    headers: HeaderStore,
    parse_response: Option<ParseResponse>,
    transform_request: Option<TransformRequest>,
    transform_response: Option<TransformResponse>,
    query_encoder: Option<QueryEncoder>,
}

impl ApiCreatorBuilder {
    /// Creates a new `ApiCreatorBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            transport: None,
            headers: HeaderStore::new(),
            parse_response: None,
            transform_request: None,
            transform_response: None,
            query_encoder: None,
        }
    }

    /// Sets the base URL every route path is appended to.
    ///
    /// It may be absolute or a bare path, and may carry its own query string,
    /// which is kept on every request.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the transport that performs the network calls.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Adds a header sent with every request, on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        validate(name.as_ref(), value.as_ref())?;
        self.headers.add(name.as_ref(), value.as_ref());
        Ok(self)
    }

    /// Sets the parser turning raw responses into results or rejections.
    pub fn parse_response<F>(mut self, parse: F) -> Self
    where
        F: Fn(RawResponse) -> Result<Value> + Send + Sync + 'static,
    {
        self.parse_response = Some(Arc::new(parse));
        self
    }

    /// Sets a transform applied to call parameters before shaping.
    pub fn transform_request<F>(mut self, transform: F) -> Self
    where
        F: Fn(Params) -> Params + Send + Sync + 'static,
    {
        self.transform_request = Some(Arc::new(transform));
        self
    }

    /// Sets a transform applied to successfully parsed responses.
    pub fn transform_response<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform_response = Some(Arc::new(transform));
        self
    }

    /// Sets the encoder used for GET query strings.
    pub fn query_encoder<F>(mut self, encode: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        self.query_encoder = Some(Arc::new(encode));
        self
    }

    /// Builds the configured `ApiCreator`.
    ///
    /// # Errors
    ///
    /// Returns an error if no transport was given and the default one cannot
    /// be built.
    pub fn build(self) -> Result<ApiCreator> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let parse_response: ParseResponse = match self.parse_response {
            Some(parse) => parse,
            None => Arc::new(default_parse_response),
        };
        let headers = HeaderStore::with_defaults(self.headers.iter());

        Ok(ApiCreator {
            inner: Arc::new(CreatorDefaults {
                base_url: self
                    .base_url
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                transport,
                parse_response,
                transform_request: self.transform_request,
                transform_response: self.transform_response,
                query_encoder: self.query_encoder.unwrap_or_else(default_query_encoder),
            }),
            headers: Arc::new(RwLock::new(headers)),
        })
    }
}

impl Default for ApiCreatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
