//! Example demonstrating hooks and configuration layers.
//!
//! This example shows how to:
//! - Rename parameters with a request transform
//! - Unwrap envelopes with a response transform
//! - Compute route headers from the shaped body
//! - Override creator settings per `create` call and per route
//! - Plug in a custom transport
//!
//! Run with: `cargo run --example hooks`

use http::StatusCode;
use serde_json::{json, Value};
use toapi::{
    transport_fn, ApiCreator, Error, HeaderStore, Overrides, RawResponse, RouteDescriptor,
    TransportRequest,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("toapi=debug,hooks=info")
        .init();

    // answers every request with a description of it, wrapped in {"data": ...}
    let transport = transport_fn(|request: TransportRequest| async move {
        let described = json!({
            "data": {
                "method": request.method.as_str(),
                "url": request.url,
                "headers": request.headers.iter().collect::<Vec<_>>(),
                "body": request.body.as_ref().and_then(|body| body.as_text()),
            }
        });
        Ok::<_, Error>(RawResponse::new(StatusCode::OK, described.to_string()))
    });

    let creator = ApiCreator::builder()
        .base_url("http://api.local/v1/accounts?tenant=acme")
        .transport(transport)
        .transform_response(|value| value["data"].clone())
        .build()?;
    creator.add_header("Authorization", "Bearer demo");

    let accounts = creator.create(
        [
            ("find", RouteDescriptor::from("/")),
            (
                "update",
                RouteDescriptor::from("PATCH /:accountId").headers_fn(|ctx| {
                    let mut headers = HeaderStore::new();
                    let fields = ctx.body.map_or(0, |body| body.len());
                    headers.add("X-Changed-Fields", fields.to_string());
                    headers
                }),
            ),
            (
                "raw",
                RouteDescriptor::from("GET /:accountId").transform_response(|value: Value| value),
            ),
        ],
        Overrides::new().transform_request(|mut params| {
            if let Some(id) = params.remove("id") {
                params.insert("accountId".to_string(), id);
            }
            params
        }),
    );

    let found = accounts.call("find", &json!({ "active": true })).await?;
    println!("find   -> {found:#}");

    let updated = accounts
        .call("update", &json!({ "id": 7, "name": "Acme", "plan": "pro" }))
        .await?;
    println!("update -> {updated:#}");

    let raw = accounts.call("raw", &json!({ "id": 7 })).await?;
    println!("raw    -> {raw:#}");

    Ok(())
}
