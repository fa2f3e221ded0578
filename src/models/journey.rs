// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journey model: an ordered multi-stop excursion.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One stop recorded during a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpotPin {
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub audio_url: String,
    pub image_url: String,
    /// Upload time (RFC 3339)
    pub uploaded_at: String,
}

/// Stored journey record in Firestore (document ID = `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    pub id: String,
    pub username: String,
    pub journeyname: String,
    /// Starting place label supplied by the client
    #[serde(default)]
    pub source: Option<String>,
    /// Last pin, filled in when the journey ends
    #[serde(default)]
    pub destination: Option<SpotPin>,
    #[serde(default)]
    pub spotpins: Vec<SpotPin>,
    /// True while the journey is in progress
    pub status: bool,
    pub created_at: String,
}

/// Where a user is in the journey lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JourneyPhase {
    NotStarted,
    /// Started, no pins yet
    Active,
    /// Started, at least one pin
    Accumulating,
    Ended,
}

/// Invalid lifecycle transitions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JourneyError {
    #[error("Journey has already ended")]
    AlreadyEnded,
}

impl Journey {
    pub fn start(username: String, journeyname: String, source: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            journeyname,
            source,
            destination: None,
            spotpins: Vec::new(),
            status: true,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn phase(&self) -> JourneyPhase {
        match (self.status, self.spotpins.is_empty()) {
            (false, _) => JourneyPhase::Ended,
            (true, true) => JourneyPhase::Active,
            (true, false) => JourneyPhase::Accumulating,
        }
    }

    /// Append a pin to an in-progress journey.
    pub fn add_pin(&mut self, pin: SpotPin) -> Result<(), JourneyError> {
        if !self.status {
            return Err(JourneyError::AlreadyEnded);
        }
        self.spotpins.push(pin);
        Ok(())
    }

    /// End the journey; the destination becomes the last pin, if any.
    pub fn end(&mut self) -> Result<Option<SpotPin>, JourneyError> {
        if !self.status {
            return Err(JourneyError::AlreadyEnded);
        }
        self.status = false;
        self.destination = self.spotpins.last().cloned();
        Ok(self.destination.clone())
    }
}

/// Lifecycle phase for a user given their active journey (if any).
pub fn phase_for(active: Option<&Journey>) -> JourneyPhase {
    active.map_or(JourneyPhase::NotStarted, Journey::phase)
}
