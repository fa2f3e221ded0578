// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation tests.
//!
//! Every case here must be rejected before the handler touches the
//! database, so they run against the offline mock.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

mod common;

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    (status, common::body_json(response).await)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_multipart(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, common::multipart_content_type())
        .body(Body::from(body))
        .unwrap()
}

async fn assert_bad_request(request: Request<Body>) {
    let (app, _) = common::create_test_app();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    assert_eq!(body["error"], "bad_request");
    assert!(body["details"].is_string());
}

// ─── Spot lookups ────────────────────────────────────────────

#[tokio::test]
async fn test_nearby_rejects_non_numeric_lat() {
    assert_bad_request(get("/nearby?lat=north&lng=77.59&SearchQuery=Food")).await;
}

#[tokio::test]
async fn test_nearby_requires_both_coordinates() {
    assert_bad_request(get("/nearby?lat=12.97&SearchQuery=Food")).await;
}

#[tokio::test]
async fn test_nearby_without_category_is_empty() {
    let (app, _) = common::create_test_app();
    let (status, body) = send(app, get("/nearby?lat=12.97&lng=77.59")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_spotintro_requires_location() {
    assert_bad_request(get("/spotintro?username=alice")).await;
}

#[tokio::test]
async fn test_fullspot_rejects_bad_lon() {
    assert_bad_request(get("/fullspot?username=alice&lat=1.0&lon=east")).await;
}

#[tokio::test]
async fn test_translation_rejects_unsupported_language() {
    assert_bad_request(get(
        "/translation?username=alice&lat=1.0&lon=2.0&lang=klingon",
    ))
    .await;
}

#[tokio::test]
async fn test_translation_requires_language() {
    assert_bad_request(get("/translation?username=alice&lat=1.0&lon=2.0")).await;
}

#[tokio::test]
async fn test_search_rejects_blank_query() {
    assert_bad_request(post_json("/search-spots", r#"{"SearchQuery": "   "}"#)).await;
}

// ─── Owner listings ──────────────────────────────────────────

#[tokio::test]
async fn test_delete_post_requires_id() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/delete-post")
        .body(Body::empty())
        .unwrap();
    assert_bad_request(request).await;
}

#[tokio::test]
async fn test_get_posts_requires_username() {
    assert_bad_request(get("/Get-Posts")).await;
}

// ─── Uploads ─────────────────────────────────────────────────

#[tokio::test]
async fn test_create_spot_requires_audio() {
    let body = common::multipart_body(
        &[("username", "alice"), ("latitude", "1.0"), ("longitude", "2.0")],
        &[("image", "spot.jpg", "image/jpeg", b"jpeg")],
    );
    assert_bad_request(post_multipart("/spots", body)).await;
}

#[tokio::test]
async fn test_create_spot_rejects_non_numeric_latitude() {
    let body = common::multipart_body(
        &[
            ("username", "alice"),
            ("latitude", "somewhere"),
            ("longitude", "2.0"),
        ],
        &[
            ("audio", "clip.m4a", "audio/mp4", b"audio"),
            ("image", "spot.jpg", "image/jpeg", b"jpeg"),
        ],
    );
    assert_bad_request(post_multipart("/spots", body)).await;
}

#[tokio::test]
async fn test_audio_title_requires_audio() {
    let body = common::multipart_body(&[("username", "alice")], &[]);
    assert_bad_request(post_multipart("/audiotitle", body)).await;
}

#[tokio::test]
async fn test_signup_requires_password() {
    let body = common::multipart_body(&[("username", "alice")], &[]);
    assert_bad_request(post_multipart("/signup", body)).await;
}

#[tokio::test]
async fn test_signup_rejects_non_image_profile_picture() {
    let body = common::multipart_body(
        &[("username", "alice"), ("password", "hunter22")],
        &[("profilepic", "notes.txt", "text/plain", b"hello")],
    );
    assert_bad_request(post_multipart("/signup", body)).await;
}

#[tokio::test]
async fn test_journey_upload_requires_image() {
    let body = common::multipart_body(
        &[("username", "alice"), ("latitude", "1.0"), ("longitude", "2.0")],
        &[("audio", "clip.m4a", "audio/mp4", b"audio")],
    );
    assert_bad_request(post_multipart("/journey-upload", body)).await;
}

// ─── Profile and journeys ────────────────────────────────────

#[tokio::test]
async fn test_follow_self_is_rejected() {
    let (app, _) = common::create_test_app();
    let (status, body) = send(
        app,
        post_json("/follow", r#"{"follower": "alice", "following": "Alice"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Invalid request.");
}

#[tokio::test]
async fn test_set_home_requires_coordinates() {
    let (app, _) = common::create_test_app();
    let (status, body) = send(
        app,
        post_json("/set-home", r#"{"username": "alice", "lon": 77.59}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Invalid or missing input data.");
}

#[tokio::test]
async fn test_start_journey_requires_name() {
    assert_bad_request(post_json(
        "/start-journey",
        r#"{"username": "alice", "source": "Home"}"#,
    ))
    .await;
}

#[tokio::test]
async fn test_memories_require_journey_name() {
    assert_bad_request(post_json(
        "/return-memories-pins",
        r#"{"username": "alice"}"#,
    ))
    .await;
}

#[tokio::test]
async fn test_journey_status_requires_username() {
    assert_bad_request(post_json("/journey-status", "{}")).await;
}

// ─── Malformed bodies ────────────────────────────────────────

#[tokio::test]
async fn test_wrongly_typed_json_field_is_bad_request() {
    assert_bad_request(post_json(
        "/set-home",
        r#"{"username": "alice", "lat": "12.9", "lon": 77.59}"#,
    ))
    .await;
}

#[tokio::test]
async fn test_unparseable_json_is_bad_request() {
    assert_bad_request(post_json("/follow", r#"{"follower": "alice","#)).await;
}

#[tokio::test]
async fn test_json_route_without_content_type_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/journey-status")
        .body(Body::from(r#"{"username": "alice"}"#))
        .unwrap();
    assert_bad_request(request).await;
}

#[tokio::test]
async fn test_upload_without_multipart_body_is_bad_request() {
    assert_bad_request(post_json("/spots", r#"{"username": "alice"}"#)).await;
}

// ─── Past validation ─────────────────────────────────────────

#[tokio::test]
async fn test_valid_profile_request_reaches_database() {
    let (app, _) = common::create_test_app();
    let (status, body) = send(
        app,
        post_json("/return-profile", r#"{"username": "alice"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
}
