// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the local Whisper speech-to-text service.

use crate::error::AppError;
use crate::services::upstream::{read_json, send_error};
use serde::Deserialize;

const SERVICE: &str = "transcription";

/// Whisper `/transcribe` response.
#[derive(Debug, Clone, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Posts MP3 audio to `{base_url}/transcribe`.
#[derive(Clone)]
pub struct TranscriptionClient {
    http: reqwest::Client,
    base_url: String,
}

impl TranscriptionClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Transcribe MP3 audio; the returned text is trimmed.
    pub async fn transcribe(&self, mp3: Vec<u8>) -> Result<Transcript, AppError> {
        let url = format!("{}/transcribe", self.base_url);
        let size = mp3.len();

        let part = reqwest::multipart::Part::bytes(mp3)
            .file_name("audio.mp3")
            .mime_str("audio/mpeg")
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid MIME type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        tracing::debug!(size, "Sending audio for transcription");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(send_error(SERVICE))?;

        let mut transcript: Transcript = read_json(SERVICE, response).await?;
        transcript.text = transcript.text.trim().to_string();

        tracing::info!(
            chars = transcript.text.len(),
            language = ?transcript.language,
            "Transcription complete"
        );
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_tolerates_missing_fields() {
        let t: Transcript = serde_json::from_str(r#"{"text": " hello "}"#).unwrap();
        assert_eq!(t.text, " hello ");
        assert!(t.language.is_none());

        let t: Transcript = serde_json::from_str("{}").unwrap();
        assert!(t.text.is_empty());
    }
}
