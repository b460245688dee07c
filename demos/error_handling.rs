//! Example demonstrating error handling.
//!
//! This example shows how to:
//! - Read the server's error body from a rejection
//! - Inspect raw responses that were not JSON
//! - Deal with results of the wrong shape
//! - Write a custom response parser
//!
//! Run with: `cargo run --example error_handling`

use serde::Deserialize;
use serde_json::{json, Value};
use toapi::{default_parse_response, ApiCreator, Error, Overrides, RouteDescriptor};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    id: u32,
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("toapi=info")
        .init();

    let creator = ApiCreator::builder()
        .base_url("https://jsonplaceholder.typicode.com")
        .build()?;

    let api = creator.create(
        [
            ("findPost", RouteDescriptor::from("GET /posts/:id")),
            (
                "findPostOrNull",
                RouteDescriptor::from("GET /posts/:id").parse_response(|response| {
                    // treat 404 as "no such post" instead of a rejection
                    if response.status.as_u16() == 404 {
                        return Ok(Value::Null);
                    }
                    default_parse_response(response)
                }),
            ),
        ],
        Overrides::default(),
    );

    println!("=== Example 1: Rejections carry the error body ===");
    match api.call("findPost", &json!({ "id": 999999 })).await {
        Ok(post) => println!("Success: {post}"),
        Err(Error::Rejected(body)) => {
            println!("Rejected!");
            println!("  Error body: {body}");
        }
        Err(Error::DeserializationFailed {
            raw_response,
            status,
            ..
        }) => {
            println!("Error body was not JSON (status {status}): {raw_response}");
        }
        Err(e) => println!("Other error: {e}"),
    }
    println!();

    println!("=== Example 2: Results of the wrong shape ===");
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct WrongSchema {
        nonexistent_field: String,
    }

    let find_post = api.method("findPost").expect("route registered above");
    match find_post.call_as::<WrongSchema, _>(&json!({ "id": 1 })).await {
        Ok(_) => println!("Unexpected success"),
        Err(Error::UnexpectedResult { value, serde_error }) => {
            println!("Unexpected shape: {serde_error}");
            println!("  Actual result: {value}");
        }
        Err(e) => println!("Other error: {e}"),
    }
    println!();

    println!("=== Example 3: A custom parser ===");
    let missing = api.call("findPostOrNull", &json!({ "id": 999999 })).await?;
    println!("Missing post resolves with: {missing}");

    let post: Post = api
        .method("findPostOrNull")
        .expect("route registered above")
        .call_as(&json!({ "id": 1 }))
        .await?;
    println!("Existing post: {post:?}");

    Ok(())
}
