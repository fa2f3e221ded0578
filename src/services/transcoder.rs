// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Audio transcoding through a local ffmpeg binary.
//!
//! Recordings arrive as AAC from the mobile client; the transcription
//! service wants MP3. Data is piped through ffmpeg's stdin/stdout so no
//! temporary files are written.

use crate::error::AppError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Wraps the ffmpeg executable.
#[derive(Clone)]
pub struct AudioTranscoder {
    ffmpeg_path: String,
}

impl AudioTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Arguments for an stdin → MP3 stdout conversion.
    fn mp3_args() -> [&'static str; 10] {
        [
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            "pipe:0",
            "-vn",
            "-f",
            "mp3",
            "-y",
            "pipe:1",
        ]
    }

    /// Convert arbitrary input audio to MP3.
    pub async fn to_mp3(&self, input: &[u8]) -> Result<Vec<u8>, AppError> {
        if input.is_empty() {
            return Err(AppError::BadRequest("Audio file is empty".to_string()));
        }

        let mut child = Command::new(&self.ffmpeg_path)
            .args(Self::mp3_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "Failed to start ffmpeg ({}): {}",
                    self.ffmpeg_path,
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("ffmpeg stdin unavailable")))?;

        // Feed stdin concurrently so a full stdout pipe can't deadlock us.
        let input = input.to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("ffmpeg did not finish: {}", e)))?;

        match writer.await {
            Ok(Ok(())) => {}
            // ffmpeg may stop reading early on bad input; its exit status tells the story.
            Ok(Err(e)) => tracing::debug!(error = %e, "ffmpeg stdin closed early"),
            Err(e) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "ffmpeg writer task failed: {}",
                    e
                )))
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(status = %output.status, stderr = %stderr.trim(), "ffmpeg conversion failed");
            return Err(AppError::BadRequest("Audio could not be decoded".to_string()));
        }

        tracing::debug!(output_bytes = output.stdout.len(), "Converted audio to MP3");
        Ok(output.stdout)
    }
}
