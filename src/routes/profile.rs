// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes: profile page, home area, area leaderboard, follows.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::badge::rank;
use crate::models::{Badge, PublicUser, User};
use crate::routes::form::{require_username, JsonBody};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/return-profile", post(return_profile))
        .route("/set-home", post(set_home))
        .route("/area-leaderboard", post(area_leaderboard))
        .route("/follow", post(follow))
        .route("/unfollow", post(unfollow))
        .route("/getfollows-info", post(follows_info))
}

/// Routes that need a session; the auth layer is added in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me))
}

#[derive(Deserialize)]
pub struct UsernameRequest {
    #[serde(default)]
    username: Option<String>,
}

async fn load_user(state: &AppState, username: &str) -> Result<User> {
    state
        .db
        .get_user(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PublicUser>> {
    let profile = load_user(&state, &user.username).await?;
    Ok(Json(PublicUser::from(&profile)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadedSpot {
    pub id: String,
    pub spotimage: String,
    pub title: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub viewscount: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub likescount: u64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub username: String,
    pub profile_image: Option<String>,
    pub postcount: u32,
    pub score: u32,
    pub uploaded_spots: Vec<UploadedSpot>,
}

/// Public profile with the user's spots and badge score.
async fn return_profile(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<UsernameRequest>,
) -> Result<Json<ProfileResponse>> {
    let username = require_username(req.username.as_deref())?;
    let user = load_user(&state, &username).await?;

    let (spots, badge) = tokio::try_join!(
        state.db.get_spots_for_user(&username),
        state.db.get_badge(&username),
    )?;

    let uploaded_spots = spots
        .into_iter()
        .map(|s| UploadedSpot {
            id: s.id,
            spotimage: s.image,
            title: s.spotname,
            viewscount: s.viewcount,
            likescount: s.likes_count,
        })
        .collect();

    Ok(Json(ProfileResponse {
        username,
        profile_image: user.profilepic,
        postcount: user.postcount,
        score: badge.map_or(0, |b| b.scores),
        uploaded_spots,
    }))
}

// ─── Home area ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetHomeRequest {
    #[serde(default)]
    username: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Record the user's home location once; later calls are no-ops.
async fn set_home(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<SetHomeRequest>,
) -> Result<Json<MessageResponse>> {
    let username = require_username(req.username.as_deref())?;
    let (Some(lat), Some(lon)) = (req.lat, req.lon) else {
        return Err(AppError::BadRequest(
            "Invalid or missing input data.".to_string(),
        ));
    };

    let mut user = load_user(&state, &username).await?;
    if user.has_home() {
        return Ok(Json(MessageResponse {
            message: "Location already set.".to_string(),
        }));
    }

    let area = resolve_area(&state, lat, lon).await?;

    user.latitude = Some(lat);
    user.longitude = Some(lon);
    user.area_name = Some(area.clone());
    state.db.upsert_user(&user).await?;

    tracing::info!(username = %username, area = %area, "Home location set");

    Ok(Json(MessageResponse {
        message: "Location and area updated successfully.".to_string(),
    }))
}

async fn resolve_area(state: &AppState, lat: f64, lon: f64) -> Result<String> {
    state.geocoder.area_name(lat, lon).await?.ok_or_else(|| {
        AppError::upstream("geocoding", format!("No area name for {},{}", lat, lon))
    })
}

#[derive(Deserialize)]
pub struct LeaderboardRequest {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub area: String,
    pub leaderboard: Vec<Badge>,
}

/// Badge scores of everyone whose home is in the caller's area.
async fn area_leaderboard(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<LeaderboardRequest>,
) -> Result<Json<LeaderboardResponse>> {
    let (Some(lat), Some(lon)) = (req.lat, req.lon) else {
        return Err(AppError::BadRequest("lat/lon missing".to_string()));
    };

    let area = resolve_area(&state, lat, lon).await?;
    let usernames: Vec<String> = state
        .db
        .get_users_in_area(&area)
        .await?
        .into_iter()
        .map(|u| u.username)
        .collect();

    let leaderboard = if usernames.is_empty() {
        Vec::new()
    } else {
        rank(state.db.get_badges_for(&usernames).await?)
    };

    tracing::debug!(area = %area, users = usernames.len(), "Area leaderboard");
    Ok(Json(LeaderboardResponse { area, leaderboard }))
}

// ─── Follows ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct FollowRequest {
    #[serde(default)]
    follower: Option<String>,
    #[serde(default)]
    following: Option<String>,
}

impl FollowRequest {
    /// (follower, following), normalized and distinct.
    fn pair(&self) -> Result<(String, String)> {
        let invalid = || AppError::BadRequest("Invalid request.".to_string());
        let follower = require_username(self.follower.as_deref()).map_err(|_| invalid())?;
        let following = require_username(self.following.as_deref()).map_err(|_| invalid())?;
        if follower == following {
            return Err(invalid());
        }
        Ok((follower, following))
    }
}

#[derive(Serialize)]
pub struct FollowResponse {
    pub success: bool,
    pub message: String,
}

async fn load_pair(state: &AppState, follower: &str, following: &str) -> Result<(User, User)> {
    let (source, target) = tokio::try_join!(
        state.db.get_user(follower),
        state.db.get_user(following),
    )?;
    match (source, target) {
        (Some(source), Some(target)) => Ok((source, target)),
        _ => Err(AppError::NotFound("User(s) not found.".to_string())),
    }
}

async fn follow(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<FollowRequest>,
) -> Result<Json<FollowResponse>> {
    let (follower, following) = req.pair()?;
    let (mut source, mut target) = load_pair(&state, &follower, &following).await?;

    let changed = source.add_following(&following) | target.add_follower(&follower);
    if changed {
        state.db.set_users_atomic(&source, &target).await?;
    }

    tracing::info!(follower = %follower, following = %following, changed, "Follow");
    Ok(Json(FollowResponse {
        success: true,
        message: format!("{} now follows {}", follower, following),
    }))
}

async fn unfollow(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<FollowRequest>,
) -> Result<Json<FollowResponse>> {
    let (follower, following) = req.pair()?;
    let (mut source, mut target) = load_pair(&state, &follower, &following).await?;

    let changed = source.remove_following(&following) | target.remove_follower(&follower);
    if changed {
        state.db.set_users_atomic(&source, &target).await?;
    }

    tracing::info!(follower = %follower, following = %following, changed, "Unfollow");
    Ok(Json(FollowResponse {
        success: true,
        message: format!("{} unfollowed {}", follower, following),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FollowsInfoResponse {
    pub success: bool,
    pub username: String,
    pub followers_count: u32,
    pub following_count: u32,
    pub followers: Vec<String>,
    pub following: Vec<String>,
}

async fn follows_info(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<UsernameRequest>,
) -> Result<Json<FollowsInfoResponse>> {
    let username = require_username(req.username.as_deref())?;
    let user = load_user(&state, &username).await?;

    Ok(Json(FollowsInfoResponse {
        success: true,
        username,
        followers_count: user.followers_count,
        following_count: user.following_count,
        followers: user.followers,
        following: user.following,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(follower: &str, following: &str) -> FollowRequest {
        FollowRequest {
            follower: Some(follower.to_string()),
            following: Some(following.to_string()),
        }
    }

    #[test]
    fn test_follow_pair_is_normalized() {
        let (a, b) = request(" Alice", "BOB ").pair().unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("alice", "bob"));
    }

    #[test]
    fn test_cannot_follow_self() {
        assert!(request("alice", "ALICE").pair().is_err());
        assert!(request("alice", "  ").pair().is_err());
    }

    #[test]
    fn test_follows_info_uses_camel_case_counts() {
        let json = serde_json::to_value(FollowsInfoResponse {
            success: true,
            username: "alice".to_string(),
            followers_count: 2,
            following_count: 1,
            followers: vec!["bob".to_string(), "carol".to_string()],
            following: vec!["bob".to_string()],
        })
        .unwrap();
        assert_eq!(json["followersCount"], 2);
        assert_eq!(json["followingCount"], 1);
    }
}
