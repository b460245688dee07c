//! Integration tests using wiremock to simulate HTTP servers, through the
//! default reqwest transport.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use toapi::{ApiCreator, Error, Overrides, RouteDescriptor};
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestData {
    id: u32,
    name: String,
}

fn users_creator(mock_server: &MockServer) -> ApiCreator {
    ApiCreator::builder()
        .base_url(format!("{}/users/", mock_server.uri()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_successful_get_request() {
    let mock_server = MockServer::start().await;

    let response_data = TestData {
        id: 1,
        name: "Test".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response_data))
        .expect(1)
        .mount(&mock_server)
        .await;

    let users = users_creator(&mock_server).create([("findById", "GET /:id")], Overrides::default());

    let data: TestData = users
        .method("findById")
        .unwrap()
        .call_as(&json!({ "id": 1 }))
        .await
        .unwrap();

    assert_eq!(data, response_data);
}

#[tokio::test]
async fn test_get_leftovers_become_query_string() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("where", r#"{"email":"bla@bla.com"}"#))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let users = users_creator(&mock_server).create([("find", "/")], Overrides::default());

    let found = users
        .call("find", &json!({ "where": { "email": "bla@bla.com" }, "limit": 10 }))
        .await
        .unwrap();

    assert_eq!(found, json!([]));
}

#[tokio::test]
async fn test_put_sends_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/users/123"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "email": "x@y.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 123 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let users =
        users_creator(&mock_server).create([("updateById", "PUT /:id")], Overrides::default());

    let updated = users
        .call("updateById", &json!({ "id": "123", "email": "x@y.com" }))
        .await
        .unwrap();

    assert_eq!(updated, json!({ "id": 123 }));
}

#[tokio::test]
async fn test_created_resolves_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 2 })))
        .mount(&mock_server)
        .await;

    let users = users_creator(&mock_server).create([("create", "POST /")], Overrides::default());

    let created = users.call("create", &json!({ "name": "New" })).await.unwrap();
    assert_eq!(created, Value::Null);
}

#[tokio::test]
async fn test_http_error_4xx_rejects_with_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "User not found" })),
        )
        .mount(&mock_server)
        .await;

    let users = users_creator(&mock_server).create([("findById", "GET /:id")], Overrides::default());

    let result = users.call("findById", &json!({ "id": 404 })).await;

    match result {
        Err(Error::Rejected(body)) => {
            assert_eq!(body, json!({ "message": "User not found" }));
        }
        _ => panic!("Expected Rejected, got {:?}", result),
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_a_deserialization_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let users = users_creator(&mock_server).create([("findById", "GET /:id")], Overrides::default());

    let result = users.call("findById", &json!({ "id": 1 })).await;

    match result {
        Err(Error::DeserializationFailed {
            raw_response,
            status,
            ..
        }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(raw_response, "Server error");
        }
        _ => panic!("Expected DeserializationFailed, got {:?}", result),
    }
}

#[tokio::test]
async fn test_base_url_query_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/v2/v1"))
        .and(query_param("foo", "bar"))
        .and(query_param("anotherId", "value3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let creator = ApiCreator::builder()
        .base_url(format!("{}/users?foo=bar", mock_server.uri()))
        .build()
        .unwrap();
    let model = creator.create([("method1", "GET /:idOnceAgain/:id")], Overrides::default());

    let result = model
        .call(
            "method1",
            &json!({ "id": "v1", "idOnceAgain": "v2", "anotherId": "value3" }),
        )
        .await
        .unwrap();

    assert_eq!(result, json!({ "ok": true }));
}

#[tokio::test]
async fn test_creator_headers_reach_the_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("x-access-token", "123"))
        .and(header("x-custom-header", "custom-value"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let creator = users_creator(&mock_server);
    let users = creator.create(
        [(
            "me",
            RouteDescriptor::new("/me").header("x-custom-header", "custom-value"),
        )],
        Overrides::default(),
    );
    creator.add_header("X-Access-Token", "123");

    users.call("me", &()).await.unwrap();
}

#[tokio::test]
async fn test_without_json_content_type_body_is_form_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("email=x%40y.com&remember=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let creator = users_creator(&mock_server);
    creator.remove_header("Content-Type");
    let users = creator.create([("login", "POST /login")], Overrides::default());

    let result = users
        .call("login", &json!({ "email": "x@y.com", "remember": true }))
        .await
        .unwrap();

    assert_eq!(result["token"], "abc");
}

#[tokio::test]
async fn test_nested_form_values_are_sent_as_json_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/search"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(
            "where=%7B%22email%22%3A%22x%40y.com%22%7D&tags=%5B1%2C2%5D",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let creator = users_creator(&mock_server);
    creator.remove_header("content-type");
    let users = creator.create([("search", "POST /search")], Overrides::default());

    let result = users
        .call(
            "search",
            &json!({ "where": { "email": "x@y.com" }, "tags": [1, 2] }),
        )
        .await
        .unwrap();

    assert_eq!(result, json!([]));
}

#[tokio::test]
async fn test_connection_failure_is_a_network_error() {
    // nothing listens on the discard port
    let creator = ApiCreator::builder()
        .base_url("http://127.0.0.1:9/users")
        .build()
        .unwrap();
    let users = creator.create([("find", "/")], Overrides::default());

    let result = users.call("find", &()).await;
    assert!(matches!(result, Err(Error::Network(_))));
}
