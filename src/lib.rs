// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spots: location-based audio stories
//!
//! Backend API for recording audio stories at places, transcribing and
//! translating them, and serving nearby search, profiles, follows and
//! multi-stop journeys.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{
    AudioTranscoder, Geocoder, StorageService, TitleSuggester, TranscriptionClient,
    TranslationClient,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub storage: StorageService,
    pub transcoder: AudioTranscoder,
    pub transcription: TranscriptionClient,
    pub translation: TranslationClient,
    pub titles: TitleSuggester,
    pub geocoder: Geocoder,
}

impl AppState {
    /// Build the external clients from configuration.
    pub fn new(config: Config, db: FirestoreDb, storage: StorageService) -> Self {
        let transcoder = AudioTranscoder::new(config.ffmpeg_path.clone());
        let transcription = TranscriptionClient::new(&config.whisper_url);
        let translation =
            TranslationClient::new(&config.lingo_api_url, config.lingo_api_key.clone());
        let titles =
            TitleSuggester::new(&config.assemblyai_api_url, config.assemblyai_api_key.clone());
        let geocoder = Geocoder::new(&config.opencage_api_url, config.opencage_api_key.clone());

        Self {
            config,
            db,
            storage,
            transcoder,
            transcription,
            translation,
            titles,
            geocoder,
        }
    }
}
