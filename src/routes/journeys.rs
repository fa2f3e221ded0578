// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journey routes.
//!
//! A user has at most one active journey. The `status` flag on the user row
//! mirrors whether that journey exists; starting and ending a journey write
//! both documents in one transaction.

use crate::error::{AppError, Result};
use crate::models::journey::phase_for;
use crate::models::{Journey, JourneyPhase, SpotPin, User};
use crate::routes::form::{require_username, JsonBody, MultipartBody, UploadForm};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/journey-status", post(journey_status))
        .route("/start-journey", post(start_journey))
        .route(
            "/journey-upload",
            post(journey_upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/return-journey-pins", post(journey_pins))
        .route("/end-journey", post(end_journey))
        .route("/return-journeys-list", post(journeys_list))
        .route("/return-memories-pins", post(memories_pins))
}

#[derive(Deserialize)]
pub struct UsernameRequest {
    #[serde(default)]
    username: Option<String>,
}

/// Pins and endpoints of one journey.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct JourneyPinsResponse {
    pub success: bool,
    pub spotpins: Vec<SpotPin>,
    pub source: Option<String>,
    pub destination: Option<SpotPin>,
}

impl From<Journey> for JourneyPinsResponse {
    fn from(journey: Journey) -> Self {
        Self {
            success: true,
            spotpins: journey.spotpins,
            source: journey.source,
            destination: journey.destination,
        }
    }
}

/// The user, required to be on a journey (403 otherwise).
async fn load_active_user(state: &AppState, username: &str) -> Result<User> {
    match state.db.get_user(username).await? {
        Some(user) if user.status => Ok(user),
        _ => Err(AppError::Forbidden(
            "User is not active or not found".to_string(),
        )),
    }
}

async fn load_active_journey(state: &AppState, username: &str) -> Result<Journey> {
    state
        .db
        .get_active_journey(username)
        .await?
        .ok_or_else(|| AppError::NotFound("Active journey not found".to_string()))
}

// ─── Status ──────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStatusResponse {
    pub journey_status: bool,
}

async fn journey_status(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<UsernameRequest>,
) -> Result<Json<JourneyStatusResponse>> {
    let username = require_username(req.username.as_deref())?;
    let user = state
        .db
        .get_user(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

    Ok(Json(JourneyStatusResponse {
        journey_status: user.status,
    }))
}

// ─── Start ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StartJourneyRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    journeyname: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJourneyResponse {
    pub success: bool,
    pub message: String,
    pub journey_id: String,
}

async fn start_journey(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<StartJourneyRequest>,
) -> Result<Json<StartJourneyResponse>> {
    let username = require_username(req.username.as_deref())?;
    let journeyname = req
        .journeyname
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("journeyname is required".to_string()))?
        .to_string();
    let source = req
        .source
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let mut user = state
        .db
        .get_user(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

    let active = state.db.get_active_journey(&username).await?;
    if user.status || phase_for(active.as_ref()) != JourneyPhase::NotStarted {
        return Err(AppError::Conflict("A journey is already active".to_string()));
    }

    let journey = Journey::start(username.clone(), journeyname, source);
    user.status = true;
    state.db.set_journey_and_user_atomic(&journey, &user).await?;

    tracing::info!(username = %username, journey_id = %journey.id, "Journey started");

    Ok(Json(StartJourneyResponse {
        success: true,
        message: "Journey started successfully".to_string(),
        journey_id: journey.id,
    }))
}

// ─── Pins ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct JourneyUploadResponse {
    pub success: bool,
    pub message: String,
    pub spotpin: SpotPin,
}

/// Add a pin (audio + image at a location) to the active journey.
async fn journey_upload(
    State(state): State<Arc<AppState>>,
    WithRejection(multipart, _): MultipartBody,
) -> Result<Json<JourneyUploadResponse>> {
    let mut form = UploadForm::collect(multipart).await?;

    let username = require_username(form.text("username"))?;
    let audio = form.require_file("audio")?;
    let image = form.require_file("image")?;
    let latitude = form.coordinate("latitude")?;
    let longitude = form.coordinate("longitude")?;
    let title = form.text("title").unwrap_or("Untitled Spot").to_string();

    load_active_user(&state, &username).await?;
    let mut journey = load_active_journey(&state, &username).await?;

    let bucket = &state.config.buckets.journeys;
    let (audio_url, image_url) = tokio::try_join!(
        state.storage.upload(
            bucket,
            "audio",
            &audio.file_name,
            &audio.content_type,
            audio.bytes
        ),
        state.storage.upload(
            bucket,
            "images",
            &image.file_name,
            &image.content_type,
            image.bytes
        ),
    )?;

    let pin = SpotPin {
        title,
        latitude,
        longitude,
        audio_url,
        image_url,
        uploaded_at: chrono::Utc::now().to_rfc3339(),
    };
    journey
        .add_pin(pin.clone())
        .map_err(|e| AppError::Conflict(e.to_string()))?;
    state.db.set_journey(&journey).await?;

    tracing::info!(
        username = %username,
        journey_id = %journey.id,
        pins = journey.spotpins.len(),
        "Journey pin added"
    );

    Ok(Json(JourneyUploadResponse {
        success: true,
        message: "Spot pin added to journey".to_string(),
        spotpin: pin,
    }))
}

/// Pins of the active journey.
async fn journey_pins(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<UsernameRequest>,
) -> Result<Json<JourneyPinsResponse>> {
    let username = require_username(req.username.as_deref())?;

    match state.db.get_user(&username).await? {
        Some(user) if user.status => {}
        _ => {
            return Err(AppError::BadRequest(
                "User not active or not found".to_string(),
            ))
        }
    }

    let journey = load_active_journey(&state, &username).await?;
    Ok(Json(journey.into()))
}

// ─── End ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EndJourneyResponse {
    pub success: bool,
    pub message: String,
    pub destination: Option<SpotPin>,
}

async fn end_journey(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<UsernameRequest>,
) -> Result<Json<EndJourneyResponse>> {
    let username = require_username(req.username.as_deref())?;

    let mut user = load_active_user(&state, &username).await?;
    let mut journey = load_active_journey(&state, &username).await?;

    let destination = journey
        .end()
        .map_err(|e| AppError::Conflict(e.to_string()))?;
    user.status = false;
    state.db.set_journey_and_user_atomic(&journey, &user).await?;

    tracing::info!(
        username = %username,
        journey_id = %journey.id,
        pins = journey.spotpins.len(),
        "Journey ended"
    );

    Ok(Json(EndJourneyResponse {
        success: true,
        message: "Journey ended and destination saved".to_string(),
        destination,
    }))
}

// ─── History ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct JourneysListResponse {
    pub success: bool,
    pub journeys: Vec<String>,
}

async fn journeys_list(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<UsernameRequest>,
) -> Result<Json<JourneysListResponse>> {
    let username = require_username(req.username.as_deref())?;

    let journeys: Vec<String> = state
        .db
        .get_journeys_for_user(&username)
        .await?
        .into_iter()
        .map(|j| j.journeyname)
        .collect();

    if journeys.is_empty() {
        return Err(AppError::NotFound("No journeys found".to_string()));
    }

    Ok(Json(JourneysListResponse {
        success: true,
        journeys,
    }))
}

#[derive(Deserialize)]
pub struct MemoriesRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    journeyname: Option<String>,
}

/// Pins of a named journey, active or ended.
async fn memories_pins(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<MemoriesRequest>,
) -> Result<Json<JourneyPinsResponse>> {
    let username = require_username(req.username.as_deref())?;
    let journeyname = req
        .journeyname
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("journeyname is required".to_string()))?;

    let journey = state
        .db
        .get_journey_by_name(&username, journeyname)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Journey '{}' not found", journeyname)))?;

    Ok(Json(journey.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pins_response_from_ended_journey() {
        let mut journey = Journey::start("alice".into(), "Coast walk".into(), Some("Pier".into()));
        journey
            .add_pin(SpotPin {
                title: "Lighthouse".to_string(),
                latitude: 1.0,
                longitude: 2.0,
                audio_url: "a".to_string(),
                image_url: "i".to_string(),
                uploaded_at: "2025-06-01T10:00:00Z".to_string(),
            })
            .unwrap();
        journey.end().unwrap();

        let response = JourneyPinsResponse::from(journey);
        assert!(response.success);
        assert_eq!(response.spotpins.len(), 1);
        assert_eq!(response.source.as_deref(), Some("Pier"));
        assert_eq!(
            response.destination.map(|d| d.title).as_deref(),
            Some("Lighthouse")
        );
    }

    #[test]
    fn test_status_response_shape() {
        let json = serde_json::to_value(JourneyStatusResponse {
            journey_status: true,
        })
        .unwrap();
        assert_eq!(json["journeyStatus"], true);
    }
}
