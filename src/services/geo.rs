// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Distance, bounding-box and nearby-ranking helpers.

use crate::models::Spot;
use geo::{coord, Distance, Haversine, Intersects, Point, Rect};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Search radius for `/nearby`, in metres.
pub const NEARBY_RADIUS_METERS: f64 = 10_000.0;

/// Radius around a geocoded place for `/search-spots`, in kilometres.
pub const SEARCH_RADIUS_KM: f64 = 2.0;

/// Kilometres per degree of latitude used for bounding boxes.
const KM_PER_DEG_LAT: f64 = 110.574;
/// Kilometres per degree of longitude at the equator.
const KM_PER_DEG_LON: f64 = 111.32;

/// Great-circle distance in metres between two lat/lon points.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    Haversine.distance(Point::new(lon1, lat1), Point::new(lon2, lat2))
}

/// Axis-aligned box of `radius_km` around a point.
///
/// Near the poles the longitude span degenerates, so the box widens to the
/// full longitude range there.
pub fn bounding_box(lat: f64, lon: f64, radius_km: f64) -> Rect<f64> {
    let lat_delta = radius_km / KM_PER_DEG_LAT;
    let cos_lat = lat.to_radians().cos();
    let lon_delta = if cos_lat.abs() < 1e-9 {
        180.0
    } else {
        radius_km / (KM_PER_DEG_LON * cos_lat.abs())
    };

    Rect::new(
        coord! { x: lon - lon_delta, y: lat - lat_delta },
        coord! { x: lon + lon_delta, y: lat + lat_delta },
    )
}

/// Whether a spot lies inside (or on the edge of) a box.
pub fn in_box(rect: &Rect<f64>, lat: f64, lon: f64) -> bool {
    rect.intersects(&Point::new(lon, lat))
}

/// A spot returned by nearby search with its distance from the caller.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NearbySpot {
    pub spotname: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: String,
    pub username: String,
    /// Metres from the query point
    pub distance: f64,
}

/// Spots of `category` within `radius_m` of the origin, nearest first.
///
/// Every candidate gets the exact haversine check; a lat/lon box would
/// miss spots across the antimeridian or near the poles.
pub fn rank_nearby<I>(
    origin_lat: f64,
    origin_lon: f64,
    spots: I,
    category: &str,
    radius_m: f64,
) -> Vec<NearbySpot>
where
    I: IntoIterator<Item = Spot>,
{
    let mut nearby: Vec<NearbySpot> = spots
        .into_iter()
        .filter(|s| s.category == category)
        .filter_map(|s| {
            let distance = distance_meters(origin_lat, origin_lon, s.latitude, s.longitude);
            (distance <= radius_m).then(|| NearbySpot {
                spotname: s.spotname,
                latitude: s.latitude,
                longitude: s.longitude,
                category: s.category,
                username: s.username,
                distance,
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    nearby
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn spot(name: &str, lat: f64, lon: f64, category: &str) -> Spot {
        Spot {
            id: name.to_string(),
            username: "alice".to_string(),
            spotname: name.to_string(),
            latitude: lat,
            longitude: lon,
            category: category.to_string(),
            description: String::new(),
            original_language: "en".to_string(),
            audio_url: String::new(),
            image: String::new(),
            viewcount: 0,
            likes_count: 0,
            caption: String::new(),
            transcription: String::new(),
            translated_captions: BTreeMap::new(),
            summary: String::new(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        // ~111.2 km on a mean-radius sphere
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_distance_is_zero_for_same_point() {
        assert!(distance_meters(12.97, 77.59, 12.97, 77.59).abs() < 1e-6);
    }

    #[test]
    fn test_bounding_box_spans_radius() {
        let rect = bounding_box(12.97, 77.59, 2.0);
        let lat_delta = 2.0 / 110.574;
        assert!((rect.max().y - (12.97 + lat_delta)).abs() < 1e-9);
        assert!((rect.min().y - (12.97 - lat_delta)).abs() < 1e-9);
        assert!(rect.max().x > 77.59 && rect.min().x < 77.59);

        assert!(in_box(&rect, 12.98, 77.60));
        assert!(!in_box(&rect, 13.10, 77.59));
    }

    #[test]
    fn test_bounding_box_at_pole_covers_all_longitudes() {
        let rect = bounding_box(90.0, 0.0, 1.0);
        assert!(in_box(&rect, 89.999, 179.0));
    }

    #[test]
    fn test_rank_nearby_filters_and_sorts() {
        let origin = (12.9716, 77.5946);
        let spots = vec![
            // ~5.5 km north
            spot("far", 13.0216, 77.5946, "Foodie Finds"),
            // ~1.1 km north
            spot("near", 12.9816, 77.5946, "Foodie Finds"),
            // close but wrong category
            spot("other", 12.9720, 77.5946, "Hidden spots"),
            // ~22 km away
            spot("outside", 13.1716, 77.5946, "Foodie Finds"),
        ];

        let ranked = rank_nearby(origin.0, origin.1, spots, "Foodie Finds", NEARBY_RADIUS_METERS);
        let names: Vec<&str> = ranked.iter().map(|s| s.spotname.as_str()).collect();

        assert_eq!(names, vec!["near", "far"]);
        assert!(ranked.iter().all(|s| s.distance <= NEARBY_RADIUS_METERS));
        assert!(ranked[0].distance < ranked[1].distance);
    }

    #[test]
    fn test_rank_nearby_keeps_spot_just_inside_radius_east() {
        // ~9.95 km due east at the equator
        let lon = 9_950.0 / 111_195.0;
        let ranked = rank_nearby(
            0.0,
            0.0,
            vec![spot("edge", 0.0, lon, "Art & Culture")],
            "Art & Culture",
            NEARBY_RADIUS_METERS,
        );
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_rank_nearby_across_antimeridian() {
        // ~2.1 km apart on either side of 180°
        let ranked = rank_nearby(
            -17.0,
            179.99,
            vec![spot("fiji", -17.0, -179.99, "Nature")],
            "Nature",
            NEARBY_RADIUS_METERS,
        );
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].distance < 2_500.0, "got {}", ranked[0].distance);
    }

    #[test]
    fn test_rank_nearby_over_the_pole() {
        // ~8.9 km apart, on opposite meridians
        let ranked = rank_nearby(
            89.96,
            0.0,
            vec![spot("station", 89.96, 180.0, "Nature")],
            "Nature",
            NEARBY_RADIUS_METERS,
        );
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].distance <= NEARBY_RADIUS_METERS);
    }

    #[test]
    fn test_rank_nearby_empty_category() {
        let ranked = rank_nearby(
            0.0,
            0.0,
            vec![spot("a", 0.0, 0.0, "Art & Culture")],
            "",
            NEARBY_RADIUS_METERS,
        );
        assert!(ranked.is_empty());
    }
}
