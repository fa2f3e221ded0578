// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spot model: an audio story recorded at a location.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coordinate tolerance (degrees) when looking a spot up by its location.
pub const COORD_TOLERANCE: f64 = 0.00001;

/// Number of transcription words kept in the generated summary.
const SUMMARY_WORDS: usize = 6;

/// Stored spot record in Firestore (document ID = `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spot {
    pub id: String,
    /// Owner username
    pub username: String,
    pub spotname: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub original_language: String,
    /// Public URL of the recorded audio
    pub audio_url: String,
    /// Public URL of the cover image
    pub image: String,
    #[serde(default)]
    pub viewcount: u64,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub transcription: String,
    /// Caption per language code ("fr", "de", "hi")
    #[serde(default)]
    pub translated_captions: BTreeMap<String, String>,
    #[serde(default)]
    pub summary: String,
    pub created_at: String,
}

impl Spot {
    /// Whether this spot sits at (`lat`, `lon`) within [`COORD_TOLERANCE`].
    pub fn is_at(&self, lat: f64, lon: f64) -> bool {
        (self.latitude - lat).abs() <= COORD_TOLERANCE
            && (self.longitude - lon).abs() <= COORD_TOLERANCE
    }
}

/// Short teaser built from the first words of a transcription.
pub fn build_summary(transcription: &str) -> String {
    let words: Vec<&str> = transcription.split_whitespace().take(SUMMARY_WORDS).collect();
    format!("Quick summary: {}...", words.join(" "))
}

/// Spot name as stored: trimmed, with a placeholder when blank.
pub fn spot_name_or_default(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => "Unnamed Spot".to_string(),
    }
}
