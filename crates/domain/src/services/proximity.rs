//! Nearby-story lookup.
//!
//! The lookup runs in two phases. A cheap latitude/longitude bounding box
//! narrows candidates in SQL, then [`rank_nearby`] refines them with the
//! exact Haversine distance and orders the result.

use chrono::{DateTime, Utc};
use geo::{point, HaversineDistance};
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::story::{NearbyStory, Story};
use crate::models::user::UserSummary;

/// Kilometers per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.0;

/// Below this `cos(lat)` the origin is treated as polar.
const POLAR_COS_EPSILON: f64 = 1e-6;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Inclusive latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box enclosing every point within `radius_km` of `center`.
    ///
    /// Latitude is clamped to `[-90, 90]`. The longitude range widens to the
    /// full `[-180, 180]` when the box would wrap the antimeridian or touch a
    /// pole, or when the origin itself is polar.
    pub fn around(center: Coordinates, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;
        let min_lat = (center.latitude - lat_delta).max(-90.0);
        let max_lat = (center.latitude + lat_delta).min(90.0);

        let cos_lat = center.latitude.to_radians().cos();
        let full_lon = (-180.0, 180.0);

        let (min_lon, max_lon) = if cos_lat.abs() < POLAR_COS_EPSILON
            || min_lat <= -90.0
            || max_lat >= 90.0
        {
            full_lon
        } else {
            let lon_delta = radius_km / (KM_PER_DEGREE * cos_lat);
            let min_lon = center.longitude - lon_delta;
            let max_lon = center.longitude + lon_delta;
            if min_lon < -180.0 || max_lon > 180.0 {
                full_lon
            } else {
                (min_lon, max_lon)
            }
        };

        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

/// Great-circle distance in kilometers using the mean earth radius.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let pa = point!(x: a.longitude, y: a.latitude);
    let pb = point!(x: b.longitude, y: b.latitude);
    pa.haversine_distance(&pb) / 1000.0
}

/// A story returned by the bounding-box query, with its poster's stored
/// location.
#[derive(Debug, Clone)]
pub struct StoryCandidate {
    pub story: Story,
    pub user: UserSummary,
    pub user_location: Coordinates,
}

fn newer_first(a: &Story, b: &Story) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Refines bounding-box candidates into the nearby result.
///
/// Expired stories and the requester's own stories are dropped, only the
/// most recent story of each poster is kept, and candidates farther than
/// `radius_km` are removed. The result is ordered by distance, then newest
/// story, then story id.
pub fn rank_nearby(
    origin: Coordinates,
    radius_km: f64,
    requester_id: Uuid,
    candidates: Vec<StoryCandidate>,
    now: DateTime<Utc>,
) -> Vec<NearbyStory> {
    let mut latest: HashMap<Uuid, StoryCandidate> = HashMap::new();
    for candidate in candidates {
        if candidate.story.is_expired_at(now) || candidate.story.user_id == requester_id {
            continue;
        }
        match latest.get(&candidate.story.user_id) {
            Some(existing) if newer_first(&existing.story, &candidate.story) != Ordering::Greater => {}
            _ => {
                latest.insert(candidate.story.user_id, candidate);
            }
        }
    }

    let mut ranked: Vec<NearbyStory> = latest
        .into_values()
        .filter_map(|c| {
            let distance_km = haversine_km(origin, c.user_location);
            (distance_km <= radius_km).then_some(NearbyStory {
                story: c.story,
                user: c.user,
                distance_km,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| newer_first(&a.story, &b.story))
    });
    ranked
}
