// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request input helpers: multipart form collection and field validation.

use crate::error::{AppError, Result};
use crate::models::user::normalize_username;
use axum::body::Bytes;
use axum::extract::{Multipart, Query};
use axum::Json;
use axum_extra::extract::WithRejection;
use std::collections::HashMap;

/// JSON request body; malformed input becomes a `bad_request` error body.
pub type JsonBody<T> = WithRejection<Json<T>, AppError>;

/// Query string, rejected the same way as [`JsonBody`].
pub type QueryParams<T> = WithRejection<Query<T>, AppError>;

pub type MultipartBody = WithRejection<Multipart, AppError>;

/// A file part from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Text fields and file parts of a multipart request, keyed by field name.
///
/// A part counts as a file when it carries a filename. Later parts with the
/// same name replace earlier ones.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    pub async fn collect(mut multipart: Multipart) -> Result<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name.is_empty() {
                continue;
            }

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read file '{}': {}", name, e))
                    })?;
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        tracing::debug!(
            fields = form.fields.len(),
            files = form.files.len(),
            "Multipart form collected"
        );
        Ok(form)
    }

    /// Trimmed text field; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require_text(&self, name: &str) -> Result<&str> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing field '{}'", name)))
    }

    /// Untrimmed field value (passwords); empty counts as absent.
    pub fn require_raw(&self, name: &str) -> Result<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("Missing field '{}'", name)))
    }

    /// Required numeric coordinate field.
    pub fn coordinate(&self, name: &str) -> Result<f64> {
        parse_coordinate(name, self.require_text(name)?)
    }

    /// Remove a non-empty file part.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.bytes.is_empty())
    }

    pub fn require_file(&mut self, name: &str) -> Result<UploadedFile> {
        self.take_file(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing file '{}'", name)))
    }

    #[cfg(test)]
    fn with(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }
}

/// Parse a finite coordinate value.
pub fn parse_coordinate(name: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::BadRequest(format!("'{}' must be a number", name)))
}

/// Normalized username from a request body; blank → 400.
pub fn require_username(raw: Option<&str>) -> Result<String> {
    raw.map(normalize_username)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("Username is required".to_string()))
}
