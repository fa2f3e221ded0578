// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spot routes: upload, lookup by location, translation, search, deletion.

use crate::error::{AppError, Result};
use crate::models::spot::{build_summary, spot_name_or_default};
use crate::models::user::normalize_username;
use crate::models::Spot;
use crate::routes::form::{
    parse_coordinate, require_username, JsonBody, MultipartBody, QueryParams, UploadForm,
    UploadedFile,
};
use crate::services::geo::{self, NearbySpot, NEARBY_RADIUS_METERS, SEARCH_RADIUS_KM};
use crate::services::title::TitleSuggestion;
use crate::services::translation::language_code;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    let uploads = Router::new()
        .route("/spots", post(create_spot))
        .route("/audiotitle", post(audio_title))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    Router::new()
        .merge(uploads)
        .route("/spotintro", get(spot_intro))
        .route("/fullspot", get(full_spot))
        .route("/translation", get(translation))
        .route("/returnsummary", get(return_summary))
        .route("/nearby", get(nearby))
        .route("/search-spots", post(search_spots))
        .route("/delete-post", delete(delete_post))
        .route("/Get-Posts", get(get_posts))
}

// ─── Upload ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CreateSpotResponse {
    pub spot: Spot,
    /// Badge score after this upload
    pub badges: u32,
    #[serde(rename = "postCount")]
    pub post_count: u32,
}

/// Create a spot from a multipart upload.
///
/// Media goes to object storage, the audio is transcoded to MP3 and
/// transcribed, and the transcription is translated into the caption
/// languages before the spot is stored.
async fn create_spot(
    State(state): State<Arc<AppState>>,
    WithRejection(multipart, _): MultipartBody,
) -> Result<(StatusCode, Json<CreateSpotResponse>)> {
    let mut form = UploadForm::collect(multipart).await?;

    let audio = form.require_file("audio")?;
    let image = form.require_file("image")?;
    let username = normalize_username(form.require_text("username")?);
    let latitude = form.coordinate("latitude")?;
    let longitude = form.coordinate("longitude")?;
    let spotname = spot_name_or_default(form.text("spotname"));
    let description = form.text("description").unwrap_or_default().to_string();
    let category = form.text("category").unwrap_or_default().to_string();

    if state.db.get_user(&username).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", username)));
    }

    // Transcoding needs the raw bytes; the upload consumes a cheap clone
    let audio_bytes = audio.bytes.clone();
    let buckets = &state.config.buckets;
    let (audio_url, image_url) = tokio::try_join!(
        upload_file(&state, &buckets.audio, "audio", audio),
        upload_file(&state, &buckets.images, "images", image),
    )?;

    let mp3 = state.transcoder.to_mp3(&audio_bytes).await?;
    let transcript = state.transcription.transcribe(mp3).await?;
    let translated_captions = state.translation.caption_set(&transcript.text).await?;

    let spot = Spot {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.clone(),
        spotname,
        latitude,
        longitude,
        category,
        description,
        original_language: "en".to_string(),
        audio_url,
        image: image_url,
        viewcount: 0,
        likes_count: 0,
        caption: transcript.text.clone(),
        summary: build_summary(&transcript.text),
        transcription: transcript.text,
        translated_captions,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    state.db.set_spot(&spot).await?;

    let badges = state.db.award_spot_badge(&username).await?;
    let post_count = state.db.refresh_post_count(&username).await?;

    tracing::info!(
        spot_id = %spot.id,
        username = %username,
        category = %spot.category,
        badges,
        post_count,
        "Spot created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateSpotResponse {
            spot,
            badges,
            post_count,
        }),
    ))
}

async fn upload_file(
    state: &AppState,
    bucket: &str,
    prefix: &str,
    file: UploadedFile,
) -> Result<String> {
    state
        .storage
        .upload(
            bucket,
            prefix,
            &file.file_name,
            &file.content_type,
            file.bytes,
        )
        .await
}

/// Suggest a title and short description for a recording.
async fn audio_title(
    State(state): State<Arc<AppState>>,
    WithRejection(multipart, _): MultipartBody,
) -> Result<Json<TitleSuggestion>> {
    let mut form = UploadForm::collect(multipart).await?;
    let audio = form.require_file("audio")?;

    let suggestion = state.titles.suggest(audio.bytes).await?;
    tracing::info!(title = %suggestion.title, "Title suggested");
    Ok(Json(suggestion))
}

// ─── Lookup by location ──────────────────────────────────────

/// `?username&lat&lon`, shared by the per-spot lookup routes.
#[derive(Deserialize)]
pub struct LocationQuery {
    username: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

/// Validated location lookup.
struct SpotLocation {
    username: String,
    latitude: f64,
    longitude: f64,
}

impl LocationQuery {
    fn validate(&self) -> Result<SpotLocation> {
        let (Some(username), Some(lat), Some(lon)) = (&self.username, &self.lat, &self.lon) else {
            return Err(AppError::BadRequest(
                "username, lat, and lon query parameters are required".to_string(),
            ));
        };
        let username = normalize_username(username);
        if username.is_empty() {
            return Err(AppError::BadRequest("username is required".to_string()));
        }

        Ok(SpotLocation {
            username,
            latitude: parse_coordinate("lat", lat)?,
            longitude: parse_coordinate("lon", lon)?,
        })
    }
}

async fn find_spot(state: &AppState, loc: &SpotLocation) -> Result<Spot> {
    state
        .db
        .find_spot_at(&loc.username, loc.latitude, loc.longitude)
        .await?
        .ok_or_else(|| {
            tracing::debug!(
                username = %loc.username,
                lat = loc.latitude,
                lon = loc.longitude,
                "No spot at location"
            );
            AppError::NotFound("Spot not found".to_string())
        })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpotIntroResponse {
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: String,
    pub description: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub viewcount: u64,
    pub spotname: String,
}

async fn spot_intro(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): QueryParams<LocationQuery>,
) -> Result<Json<SpotIntroResponse>> {
    let loc = query.validate()?;
    let spot = find_spot(&state, &loc).await?;

    Ok(Json(SpotIntroResponse {
        username: loc.username,
        latitude: loc.latitude,
        longitude: loc.longitude,
        category: spot.category,
        description: spot.description,
        viewcount: spot.viewcount,
        spotname: spot.spotname,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FullSpotResponse {
    pub id: String,
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image: String,
    pub audio: String,
    pub spotname: String,
    /// Full transcription
    pub script: String,
}

/// Full spot details; counts as a view.
async fn full_spot(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): QueryParams<LocationQuery>,
) -> Result<Json<FullSpotResponse>> {
    let loc = query.validate()?;
    let spot = find_spot(&state, &loc).await?;

    let views = state.db.increment_view_count(&spot).await?;
    tracing::debug!(spot_id = %spot.id, views, "View recorded");

    Ok(Json(FullSpotResponse {
        id: spot.id,
        username: loc.username,
        latitude: loc.latitude,
        longitude: loc.longitude,
        image: spot.image,
        audio: spot.audio_url,
        spotname: spot.spotname,
        script: spot.transcription,
    }))
}

#[derive(Deserialize)]
pub struct TranslationQuery {
    #[serde(flatten)]
    location: LocationQuery,
    lang: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TranslationResponse {
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub language: String,
    pub translation: String,
}

/// Caption of a spot in the requested language. English is the
/// transcription itself.
async fn translation(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): QueryParams<TranslationQuery>,
) -> Result<Json<TranslationResponse>> {
    let loc = query.location.validate()?;
    let lang = query
        .lang
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("lang query parameter is required".to_string()))?;
    let code = language_code(lang)
        .ok_or_else(|| AppError::BadRequest(format!("Unsupported language: {}", lang)))?;

    let spot = find_spot(&state, &loc).await?;

    let text = match code {
        "en" => Some(spot.transcription.clone()),
        _ => spot.translated_captions.get(code).cloned(),
    }
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| AppError::NotFound(format!("Translation for language '{}' not found", code)))?;

    Ok(Json(TranslationResponse {
        username: spot.username,
        latitude: spot.latitude,
        longitude: spot.longitude,
        language: code.to_string(),
        translation: text,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SummaryResponse {
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
    pub spotname: String,
    pub description: String,
    pub summary: String,
}

async fn return_summary(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): QueryParams<LocationQuery>,
) -> Result<Json<SummaryResponse>> {
    let loc = query.validate()?;
    let spot = find_spot(&state, &loc).await?;

    Ok(Json(SummaryResponse {
        username: loc.username,
        latitude: loc.latitude,
        longitude: loc.longitude,
        spotname: spot.spotname,
        description: spot.description,
        summary: spot.summary,
    }))
}

// ─── Search ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NearbyQuery {
    lat: Option<String>,
    lng: Option<String>,
    #[serde(rename = "SearchQuery")]
    category: Option<String>,
}

/// Spots of one category within 10 km, nearest first.
async fn nearby(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): QueryParams<NearbyQuery>,
) -> Result<Json<Vec<NearbySpot>>> {
    let (Some(lat), Some(lng)) = (&query.lat, &query.lng) else {
        return Err(AppError::BadRequest(
            "lat & lng query params are required numbers".to_string(),
        ));
    };
    let lat = parse_coordinate("lat", lat)?;
    let lng = parse_coordinate("lng", lng)?;

    // No category matches nothing
    let Some(category) = query.category.filter(|c| !c.is_empty()) else {
        return Ok(Json(Vec::new()));
    };

    let spots = state.db.get_spots_in_category(&category).await?;
    let scanned = spots.len();
    let result = geo::rank_nearby(lat, lng, spots, &category, NEARBY_RADIUS_METERS);

    tracing::info!(
        category = %category,
        scanned,
        matched = result.len(),
        "Nearby search"
    );
    Ok(Json(result))
}

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "SearchQuery", default)]
    query: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    /// Formatted address of the geocoded place
    pub location: String,
    pub total_spots: usize,
    pub spots: Vec<Spot>,
}

/// Spots within 2 km of a geocoded place name.
async fn search_spots(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("SearchQuery is required".to_string()));
    }

    let place = state
        .geocoder
        .forward(query)
        .await?
        .ok_or_else(|| AppError::NotFound("Location not found".to_string()))?;

    let rect = geo::bounding_box(place.latitude, place.longitude, SEARCH_RADIUS_KM);
    let spots: Vec<Spot> = state
        .db
        .get_spots_in_latitude_band(rect.min().y, rect.max().y)
        .await?
        .into_iter()
        .filter(|s| geo::in_box(&rect, s.latitude, s.longitude))
        .collect();

    tracing::info!(query, location = %place.formatted, found = spots.len(), "Place search");

    Ok(Json(SearchResponse {
        location: place.formatted,
        total_spots: spots.len(),
        spots,
    }))
}

// ─── Owner listings ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct DeleteQuery {
    id: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: String,
    #[serde(rename = "postCount")]
    pub post_count: u32,
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): QueryParams<DeleteQuery>,
) -> Result<Json<DeleteResponse>> {
    let id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("ID is required".to_string()))?;

    let spot = state
        .db
        .get_spot(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Spot {} not found", id)))?;

    state.db.delete_spot(&spot.id).await?;
    let post_count = state.db.refresh_post_count(&spot.username).await?;

    tracing::info!(spot_id = %spot.id, username = %spot.username, "Spot deleted");

    Ok(Json(DeleteResponse {
        message: "Spot deleted successfully".to_string(),
        post_count,
    }))
}

#[derive(Deserialize)]
pub struct PostsQuery {
    username: Option<String>,
}

#[derive(Serialize)]
pub struct PostsResponse {
    pub posts: Vec<Spot>,
}

async fn get_posts(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): QueryParams<PostsQuery>,
) -> Result<Json<PostsResponse>> {
    let username = require_username(query.username.as_deref())?;
    let posts = state.db.get_spots_for_user(&username).await?;
    Ok(Json(PostsResponse { posts }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(username: Option<&str>, lat: Option<&str>, lon: Option<&str>) -> LocationQuery {
        LocationQuery {
            username: username.map(str::to_string),
            lat: lat.map(str::to_string),
            lon: lon.map(str::to_string),
        }
    }

    #[test]
    fn test_location_query_validation() {
        let loc = query(Some(" Alice "), Some("12.5"), Some("77.25"))
            .validate()
            .unwrap();
        assert_eq!(loc.username, "alice");
        assert_eq!(loc.latitude, 12.5);
        assert_eq!(loc.longitude, 77.25);

        assert!(query(None, Some("1"), Some("2")).validate().is_err());
        assert!(query(Some("a"), Some("north"), Some("2")).validate().is_err());
        assert!(query(Some("  "), Some("1"), Some("2")).validate().is_err());
    }

    #[test]
    fn test_delete_response_uses_camel_case_post_count() {
        let json = serde_json::to_value(DeleteResponse {
            message: "ok".to_string(),
            post_count: 3,
        })
        .unwrap();
        assert_eq!(json["postCount"], 3);
    }
}
