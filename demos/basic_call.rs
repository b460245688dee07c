//! Basic example: describe a REST resource, then call it.
//!
//! This example shows how to:
//! - Build a creator for a base URL
//! - Declare routes in the compact `"METHOD /path"` form
//! - Call methods with path parameters, query parameters and bodies
//!
//! Run with: `cargo run --example basic_call`

use serde::Deserialize;
use serde_json::json;
use toapi::{ApiCreator, Error, Overrides};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("toapi=debug,basic_call=info")
        .init();

    let creator = ApiCreator::builder()
        .base_url("https://jsonplaceholder.typicode.com/posts")
        .build()?;

    let posts = creator.create(
        [
            ("find", "/"),
            ("findById", "GET /:id"),
            ("create", "POST /"),
            ("updateById", "PUT /:id"),
        ],
        Overrides::default(),
    );

    println!("=== GET with a path parameter ===");
    let find_by_id = posts.method("findById").expect("route registered above");
    let post: Post = find_by_id.call_as(&json!({ "id": 1 })).await?;
    println!("Post {}: {}", post.id, post.title);
    println!();

    println!("=== GET with leftovers as query string ===");
    let found = posts.call("find", &json!({ "userId": 1 })).await?;
    println!("Found {} posts", found.as_array().map_or(0, Vec::len));
    println!();

    println!("=== POST: leftovers become the JSON body ===");
    // 201 Created resolves with null under the default parser
    let created = posts
        .call(
            "create",
            &json!({ "title": "My New Post", "body": "Content", "userId": 1 }),
        )
        .await?;
    println!("Created: {created}");
    println!();

    println!("=== PUT: path parameter plus body ===");
    let updated = posts
        .call("updateById", &json!({ "id": 1, "title": "Renamed" }))
        .await?;
    println!("Updated: {updated}");

    Ok(())
}
