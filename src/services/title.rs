// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Title and short description suggestions for a recording (AssemblyAI).
//!
//! The audio is uploaded, a transcript with auto-chapters is requested, and
//! the job is polled until it completes. The first chapter's headline and
//! summary become the suggestion.

use crate::error::AppError;
use crate::services::upstream::{read_json, send_error};
use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const SERVICE: &str = "assemblyai";
const POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Give up after this many polls (~5 minutes).
const MAX_POLLS: u32 = 100;
const DESCRIPTION_SENTENCES: usize = 2;

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    auto_chapters: bool,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptJob {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub chapters: Option<Vec<Chapter>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Suggested title and two-sentence description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TitleSuggestion {
    pub title: String,
    pub description: String,
}

/// AssemblyAI client.
#[derive(Clone)]
pub struct TitleSuggester {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TitleSuggester {
    pub fn new(base_url: &str, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub async fn suggest(&self, audio: Bytes) -> Result<TitleSuggestion, AppError> {
        let upload: UploadResponse = read_json(
            SERVICE,
            self.http
                .post(format!("{}/upload", self.base_url))
                .header(reqwest::header::AUTHORIZATION, &self.api_key)
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(audio)
                .send()
                .await
                .map_err(send_error(SERVICE))?,
        )
        .await?;

        let job: TranscriptJob = read_json(
            SERVICE,
            self.http
                .post(format!("{}/transcript", self.base_url))
                .header(reqwest::header::AUTHORIZATION, &self.api_key)
                .json(&TranscriptRequest {
                    audio_url: &upload.upload_url,
                    auto_chapters: true,
                })
                .send()
                .await
                .map_err(send_error(SERVICE))?,
        )
        .await?;

        tracing::info!(transcript_id = %job.id, "Transcription job started");
        let done = self.wait_for(&job.id).await?;
        Ok(suggestion_from(&done))
    }

    async fn wait_for(&self, transcript_id: &str) -> Result<TranscriptJob, AppError> {
        let url = format!("{}/transcript/{}", self.base_url, transcript_id);

        for attempt in 1..=MAX_POLLS {
            let job: TranscriptJob = read_json(
                SERVICE,
                self.http
                    .get(&url)
                    .header(reqwest::header::AUTHORIZATION, &self.api_key)
                    .send()
                    .await
                    .map_err(send_error(SERVICE))?,
            )
            .await?;

            match job.status.as_str() {
                "completed" => return Ok(job),
                "error" => {
                    return Err(AppError::upstream(
                        SERVICE,
                        format!(
                            "Transcription failed: {}",
                            job.error.as_deref().unwrap_or("unknown error")
                        ),
                    ))
                }
                status => {
                    tracing::debug!(transcript_id, attempt, status, "Waiting for transcription");
                }
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }

        Err(AppError::upstream(
            SERVICE,
            format!("Transcription {} did not finish in time", transcript_id),
        ))
    }
}

/// Build the suggestion from a completed transcript.
pub fn suggestion_from(job: &TranscriptJob) -> TitleSuggestion {
    let first = job.chapters.as_ref().and_then(|c| c.first());

    let title = first
        .and_then(|c| c.headline.clone())
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "No title generated".to_string());

    let description = first
        .and_then(|c| c.summary.as_deref())
        .map(first_sentences)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "No short description available".to_string());

    TitleSuggestion { title, description }
}

/// First two sentences of `text`, terminated by a period.
fn first_sentences(text: &str) -> String {
    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(DESCRIPTION_SENTENCES)
        .collect();

    if sentences.is_empty() {
        return String::new();
    }
    format!("{}.", sentences.join(". "))
}
