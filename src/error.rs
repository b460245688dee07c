//! Error types for generated API calls.
//!
//! Remote rejections keep the parsed error body exactly as the server sent it.
//! Transport failures are propagated unwrapped.

use http::StatusCode;
use serde_json::Value;

/// The main error type for API creation and API calls.
///
/// # Examples
///
/// ```no_run
/// use toapi::{ApiCreator, Error, Overrides};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Error> {
/// let creator = ApiCreator::builder()
///     .base_url("https://api.example.com/users")
///     .build()?;
/// let users = creator.create([("findById", "GET /:id")], Overrides::default());
///
/// match users.call("findById", &json!({ "id": 42 })).await {
///     Ok(user) => println!("User: {user}"),
///     Err(Error::Rejected(body)) => eprintln!("Server said no: {body}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid configuration was provided.
    ///
    /// Raised while building an [`ApiCreator`](crate::ApiCreator), for example
    /// for a header that is not valid HTTP, or when a declarative route map
    /// cannot be read.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The response was rejected by the response parser.
    ///
    /// With the default parser this is any response with a status of 400 or
    /// above; the payload is the parsed JSON error body, untouched.
    #[error("Request rejected: {0}")]
    Rejected(Value),

    /// A network-level error raised by the default `reqwest` transport.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Any failure raised by a custom transport.
    #[error("Transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The response body was expected to be JSON but was not.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Call parameters or the request body could not be serialized.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// A parsed result did not have the shape asked for with
    /// [`ApiMethod::call_as`](crate::ApiMethod::call_as).
    #[error("Unexpected result shape: {serde_error}")]
    UnexpectedResult {
        /// The parsed (and transformed) result
        value: Value,
        /// The serde error message
        serde_error: String,
    },

    /// [`Api::call`](crate::Api::call) was given a name with no route behind it.
    #[error("Unknown API method: {0}")]
    UnknownMethod(String),
}

impl Error {
    /// Wraps an arbitrary error raised by a custom transport.
    ///
    /// # Examples
    ///
    /// ```
    /// use toapi::Error;
    ///
    /// let err = Error::transport(std::io::Error::other("connection reset"));
    /// assert!(matches!(err, Error::Transport(_)));
    /// ```
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport(error.into())
    }

    /// Returns the rejection payload if this error is a remote rejection.
    pub fn rejection(&self) -> Option<&Value> {
        match self {
            Error::Rejected(body) => Some(body),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this error has one.
    ///
    /// Rejections carry no status of their own; only network errors from
    /// `reqwest` and deserialization failures do.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for API creation and calls.
pub type Result<T> = std::result::Result<T, Error>;
