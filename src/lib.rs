//! # toapi - declarative HTTP API clients
//!
//! Describe an HTTP API as a map of method names to routes, and get back an
//! object whose methods each perform one HTTP call. Path parameters are bound
//! from the call's parameter object, what is left becomes the query string of
//! a GET or the JSON body of anything else, and the response is parsed into a
//! JSON value or rejected with the server's error body.
//!
//! ## Quick Start
//!
//! ```no_run
//! use serde::Deserialize;
//! use serde_json::json;
//! use toapi::{ApiCreator, Overrides, RouteDescriptor};
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     email: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), toapi::Error> {
//!     let creator = ApiCreator::builder()
//!         .base_url("https://api.example.com/users/")
//!         .header("User-Agent", "my-app/1.0")?
//!         .build()?;
//!
//!     let users = creator.create(
//!         [
//!             ("find", RouteDescriptor::from("/")),
//!             ("findById", RouteDescriptor::from("GET /:id")),
//!             ("create", RouteDescriptor::from("POST /")),
//!             ("updateById", RouteDescriptor::from("PUT /:id")),
//!             ("deleteById", RouteDescriptor::from("DELETE /:id")),
//!         ],
//!         Overrides::default(),
//!     );
//!
//!     // GET https://api.example.com/users/123
//!     let user: User = users
//!         .method("findById")
//!         .unwrap()
//!         .call_as(&json!({ "id": 123 }))
//!         .await?;
//!     println!("User {}: {}", user.id, user.email);
//!
//!     // PUT https://api.example.com/users/123 with {"email":"x@y.com"}
//!     users
//!         .call("updateById", &json!({ "id": "123", "email": "x@y.com" }))
//!         .await?;
//!
//!     // GET https://api.example.com/users?where=%7B%22active%22%3Atrue%7D
//!     let active = users.call("find", &json!({ "where": { "active": true } })).await?;
//!     println!("Active users: {active}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration layers
//!
//! Every setting is resolved per field, most specific first:
//!
//! 1. the [`RouteDescriptor`] (headers, transforms, response parser),
//! 2. the [`Overrides`] passed to [`ApiCreator::create`],
//! 3. the [`ApiCreator`]'s own defaults.
//!
//! ## Error Handling
//!
//! With the default parser any status of 400 and above is a rejection whose
//! payload is the server's JSON error body:
//!
//! ```no_run
//! use serde_json::json;
//! use toapi::{ApiCreator, Error, Overrides};
//!
//! # async fn example() -> Result<(), Error> {
//! # let creator = ApiCreator::new()?;
//! # let users = creator.create([("findById", "GET /:id")], Overrides::default());
//! match users.call("findById", &json!({ "id": 1 })).await {
//!     Ok(user) => println!("Found: {user}"),
//!     Err(Error::Rejected(body)) => eprintln!("Rejected: {body}"),
//!     Err(Error::DeserializationFailed { raw_response, status, .. }) => {
//!         eprintln!("Not JSON (status {status}): {raw_response}");
//!     }
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Nothing is retried; a transport failure surfaces exactly once.

mod api;
pub mod config;
mod creator;
mod error;
mod headers;
mod response;
pub mod route;
pub mod shaper;
pub mod transport;

pub use api::{Api, ApiMethod};
pub use config::Overrides;
pub use creator::{ApiCreator, ApiCreatorBuilder, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use headers::{HeaderStore, DEFAULT_HEADERS};
pub use response::{default_parse_response, RawResponse};
pub use route::{RouteDescriptor, RouteMap};
pub use shaper::{Params, RequestTriple};
pub use transport::{transport_fn, ReqwestTransport, Transport, TransportRequest};
