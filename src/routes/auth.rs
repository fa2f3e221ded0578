// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: signup, login, logout.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL};
use crate::models::user::normalize_username;
use crate::models::{PublicUser, User};
use crate::routes::form::{JsonBody, MultipartBody, UploadForm};
use crate::services::password::{hash_password, verify_password};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/signup",
            post(signup).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/login", post(login))
        .route("/logout", post(logout))
}

// ─── Signup ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignupResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Create an account from a multipart form (`username`, `password`,
/// optional `profilepic` image).
async fn signup(
    State(state): State<Arc<AppState>>,
    WithRejection(multipart, _): MultipartBody,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let mut form = UploadForm::collect(multipart).await?;

    let username = normalize_username(form.require_text("username")?);
    let password = form.require_raw("password")?.to_string();

    let profilepic = form.take_file("profilepic");
    if let Some(pic) = &profilepic {
        if !pic.content_type.starts_with("image/") {
            return Err(AppError::BadRequest(
                "Profile picture must be an image".to_string(),
            ));
        }
    }

    if state.db.get_user(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let profilepic_url = match profilepic {
        Some(pic) => {
            state
                .storage
                .upload(
                    &state.config.buckets.profile_pics,
                    "profilepics",
                    &pic.file_name,
                    &pic.content_type,
                    pic.bytes,
                )
                .await?
        }
        None => state.config.default_profile_pic.clone(),
    };

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(e.into()))?;

    let user = User::new(username, password_hash, Some(profilepic_url));
    state.db.insert_user(&user).await?;

    tracing::info!(username = %user.username, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user: PublicUser::from(&user),
        }),
    ))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
}

/// Verify credentials and issue a one-hour session token.
///
/// The token is returned in the body and also set as an HttpOnly cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let username = normalize_username(&req.username);
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = state.db.get_user(&username).await?.ok_or_else(|| {
        tracing::info!(username = %username, "Login for unknown user");
        AppError::BadRequest(INVALID_CREDENTIALS.to_string())
    })?;

    let password = req.password;
    let stored = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(e.into()))?;

    if !valid {
        tracing::info!(username = %username, "Login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = create_jwt(&username, &state.config.jwt_signing_key, SESSION_TTL)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(username = %username, "User logged in");

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Json(LoginResponse { token })))
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}
