// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod form;
pub mod journeys;
pub mod profile;
pub mod spots;

use crate::middleware::{auth::require_auth, security::add_security_headers};
use crate::AppState;
use axum::http::{header, request::Parts, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Origin prefixes of the mobile dev tooling (Expo, simulators).
const DEV_ORIGIN_PREFIXES: [&str; 2] = ["http://localhost", "http://127.0.0.1"];

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
    })
}

fn is_allowed_origin(origin: &str, frontend_url: &str) -> bool {
    origin == frontend_url || DEV_ORIGIN_PREFIXES.iter().any(|p| origin.starts_with(p))
}

fn cors_layer(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|o| is_allowed_origin(o, &frontend_url))
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload = state.config.max_upload_bytes;

    // Upload routes carry their own body limit
    let app_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes(max_upload))
        .merge(spots::routes(max_upload))
        .merge(profile::routes())
        .merge(journeys::routes(max_upload));

    let session_routes = profile::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(app_routes)
        .merge(session_routes)
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors_layer(state.config.frontend_url.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins() {
        let frontend = "https://spots.example.com";
        assert!(is_allowed_origin(frontend, frontend));
        assert!(is_allowed_origin("http://localhost:8081", frontend));
        assert!(is_allowed_origin("http://127.0.0.1:19006", frontend));
        assert!(!is_allowed_origin("https://spots.example.com.evil.net", frontend));
        assert!(!is_allowed_origin("https://localhost", frontend));
    }
}
