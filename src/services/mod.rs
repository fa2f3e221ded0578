// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - geo logic, media handling and third-party clients.

pub mod geo;
pub mod geocoding;
pub mod password;
pub mod storage;
pub mod title;
pub mod transcoder;
pub mod transcription;
pub mod translation;
mod upstream;

pub use geocoding::Geocoder;
pub use storage::StorageService;
pub use title::TitleSuggester;
pub use transcoder::AudioTranscoder;
pub use transcription::TranscriptionClient;
pub use translation::TranslationClient;
