// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response handling shared by the third-party HTTP clients.

use crate::error::AppError;
use serde::de::DeserializeOwned;

/// Longest upstream error body kept in logs.
const MAX_ERROR_BODY: usize = 512;

/// Check the status and parse a JSON body, mapping failures to `AppError::Upstream`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));

        if status.as_u16() == 429 {
            tracing::warn!(service, "Upstream rate limit hit (429)");
        }
        return Err(AppError::upstream(service, format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::upstream(service, format!("JSON parse error: {}", e)))
}

/// Map a transport-level reqwest failure.
pub(crate) fn send_error(service: &'static str) -> impl Fn(reqwest::Error) -> AppError {
    move |e| AppError::upstream(service, format!("Request failed: {}", e))
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_char_boundary() {
        assert_eq!(floor_char_boundary("short", 512), 5);
        // "é" is two bytes; index 1 is inside it
        assert_eq!(floor_char_boundary("éa", 1), 0);
        assert_eq!(floor_char_boundary("aé", 2), 1);
    }
}
