// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Forward and reverse geocoding (OpenCage).

use crate::error::AppError;
use crate::services::upstream::{read_json, send_error};
use serde::Deserialize;

const SERVICE: &str = "geocoding";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    geometry: Geometry,
    #[serde(default)]
    formatted: String,
    #[serde(default)]
    components: AddressComponents,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

/// Address parts used to name an area, most specific first.
#[derive(Debug, Default, Deserialize)]
pub struct AddressComponents {
    pub suburb: Option<String>,
    pub neighbourhood: Option<String>,
    pub city_district: Option<String>,
    pub city: Option<String>,
}

impl AddressComponents {
    /// suburb → neighbourhood → city_district → city
    pub fn area_name(&self) -> Option<String> {
        [
            &self.suburb,
            &self.neighbourhood,
            &self.city_district,
            &self.city,
        ]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .cloned()
    }
}

/// A geocoded place.
#[derive(Debug, Clone)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted: String,
}

/// OpenCage client.
#[derive(Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl Geocoder {
    pub fn new(url: &str, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
            api_key,
        }
    }

    async fn query(&self, q: &str) -> Result<Vec<GeocodeHit>, AppError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("q", q), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(send_error(SERVICE))?;

        let parsed: GeocodeResponse = read_json(SERVICE, response).await?;
        Ok(parsed.results)
    }

    /// Best match for a free-text place query.
    pub async fn forward(&self, query: &str) -> Result<Option<Place>, AppError> {
        let hits = self.query(query).await?;
        tracing::debug!(query, hits = hits.len(), "Forward geocode");

        Ok(hits.into_iter().next().map(|hit| Place {
            latitude: hit.geometry.lat,
            longitude: hit.geometry.lng,
            formatted: hit.formatted,
        }))
    }

    /// Neighbourhood-level area name for coordinates.
    pub async fn area_name(&self, lat: f64, lon: f64) -> Result<Option<String>, AppError> {
        let hits = self.query(&format!("{},{}", lat, lon)).await?;
        let area = hits.into_iter().next().and_then(|h| h.components.area_name());
        tracing::debug!(lat, lon, area = ?area, "Reverse geocode");
        Ok(area)
    }
}
