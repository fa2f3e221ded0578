// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Caption translation through the Lingo.dev localization engine.

use crate::error::AppError;
use crate::services::upstream::{read_json, send_error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SERVICE: &str = "translation";

/// Captions are produced for these languages: (storage key, engine locale).
pub const CAPTION_LOCALES: [(&str, &str); 3] = [("fr", "fr-FR"), ("de", "de-DE"), ("hi", "hi-IN")];

/// Map a language name from the client ("French") to its caption key.
pub fn language_code(name: &str) -> Option<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "english" => Some("en"),
        "french" => Some("fr"),
        "hindi" => Some("hi"),
        "german" => Some("de"),
        _ => None,
    }
}

#[derive(Serialize)]
struct LocalizeRequest<'a> {
    params: LocalizeParams,
    locale: LocalePair<'a>,
    data: TextPayload<'a>,
}

#[derive(Serialize)]
struct LocalizeParams {
    fast: bool,
}

#[derive(Serialize)]
struct LocalePair<'a> {
    source: &'a str,
    target: &'a str,
}

#[derive(Serialize)]
struct TextPayload<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct LocalizeResponse {
    data: TranslatedPayload,
}

#[derive(Deserialize)]
struct TranslatedPayload {
    text: String,
}

/// Lingo.dev engine client.
#[derive(Clone)]
pub struct TranslationClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TranslationClient {
    pub fn new(base_url: &str, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Translate English `text` into `target_locale` (e.g. "fr-FR").
    pub async fn translate(&self, text: &str, target_locale: &str) -> Result<String, AppError> {
        let body = LocalizeRequest {
            params: LocalizeParams { fast: true },
            locale: LocalePair {
                source: "en",
                target: target_locale,
            },
            data: TextPayload { text },
        };

        let response = self
            .http
            .post(format!("{}/i18n", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(send_error(SERVICE))?;

        let parsed: LocalizeResponse = read_json(SERVICE, response).await.map_err(|e| {
            tracing::error!(target_locale, error = %e, "Translation failed");
            e
        })?;
        Ok(parsed.data.text)
    }

    /// Translate a transcription into every caption language concurrently.
    ///
    /// Blank input yields no captions rather than empty strings.
    pub async fn caption_set(&self, text: &str) -> Result<BTreeMap<String, String>, AppError> {
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let [(fr_key, fr), (de_key, de), (hi_key, hi)] = CAPTION_LOCALES;
        let (fr_text, de_text, hi_text) = tokio::try_join!(
            self.translate(text, fr),
            self.translate(text, de),
            self.translate(text, hi),
        )?;

        Ok(BTreeMap::from([
            (fr_key.to_string(), fr_text),
            (de_key.to_string(), de_text),
            (hi_key.to_string(), hi_text),
        ]))
    }
}
