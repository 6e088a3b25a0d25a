//! Router-level tests: requests go through `api_router`, so path wiring, the
//! nested selection routers and the `x-client-id` middleware are exercised
//! together.

mod common;

use api_lib::web::api_router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::state;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

async fn send(app: &Router, method: &str, uri: &str, client: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(client) = client {
        request = request.header("x-client-id", client);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, client: Option<&str>) -> (StatusCode, Value) {
    let (status, body) = send(app, method, uri, client).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn full_comparison_list_refuses_a_fourth_listing() {
    let app = api_router(state());
    let me = Uuid::new_v4().to_string();

    for id in ["1", "2", "3"] {
        let (status, body) = send_json(&app, "POST", &format!("/compare/{}", id), Some(&me)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
    let (status, body) = send_json(&app, "POST", "/compare/4", Some(&me)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["ids"], serde_json::json!(["1", "2", "3"]));
    assert_eq!(body["list"], "comparison");
    assert_eq!(body["capacity"], 3);

    let (status, body) = send_json(&app, "GET", "/compare", Some(&me)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ids"], serde_json::json!(["1", "2", "3"]));
}

#[tokio::test]
async fn selection_routes_require_a_valid_client_id() {
    let app = api_router(state());

    let (status, body) = send(&app, "GET", "/compare", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "x-client-id header is required");

    let (status, body) = send(&app, "POST", "/favorites/1", Some("not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "Invalid x-client-id format");

    // Listing routes do not need the header.
    let (status, _) = send(&app, "GET", "/properties", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn resolved_comparison_is_served_in_list_order() {
    let app = api_router(state());
    let me = Uuid::new_v4().to_string();
    for id in ["3", "1"] {
        send(&app, "POST", &format!("/compare/{}", id), Some(&me)).await;
    }

    let (status, body) = send_json(&app, "GET", "/compare/properties", Some(&me)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body.as_array().unwrap().iter().map(|p| p["id"].clone()).collect();
    assert_eq!(ids, [serde_json::json!("3"), serde_json::json!("1")]);
}

#[tokio::test]
async fn favorites_are_nested_separately_from_the_comparison_list() {
    let app = api_router(state());
    let me = Uuid::new_v4().to_string();

    for id in ["1", "2", "3", "4"] {
        let (_, body) = send_json(&app, "POST", &format!("/favorites/{}", id), Some(&me)).await;
        assert_eq!(body["success"], true);
    }
    let (_, body) = send_json(&app, "POST", "/favorites/2/toggle", Some(&me)).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["ids"], serde_json::json!(["1", "3", "4"]));
    assert_eq!(body["capacity"], Value::Null);

    let (_, body) = send_json(&app, "GET", "/compare", Some(&me)).await;
    assert_eq!(body["ids"], serde_json::json!([]));

    let (status, _) = send(&app, "DELETE", "/favorites", Some(&me)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send_json(&app, "GET", "/favorites", Some(&me)).await;
    assert_eq!(body["ids"], serde_json::json!([]));
}

#[tokio::test]
async fn map_route_is_not_taken_for_a_property_id() {
    let app = api_router(state());

    let (status, body) = send_json(&app, "GET", "/properties/map", None).await;
    assert_eq!(status, StatusCode::OK);
    let pins = body.as_array().unwrap();
    assert_eq!(pins.len(), 4);
    for pin in pins {
        let x = pin["x"].as_f64().unwrap();
        let y = pin["y"].as_f64().unwrap();
        assert!((15.0..=85.0).contains(&x) && (15.0..=85.0).contains(&y));
    }

    let (status, body) = send_json(&app, "GET", "/properties/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Villa in New Cairo");
}

#[tokio::test]
async fn unknown_listing_is_not_found() {
    let app = api_router(state());
    let (status, _) = send(&app, "GET", "/properties/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", "/properties/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
