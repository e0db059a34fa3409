//! Story domain models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;

/// Fixed lifetime of a story.
pub const STORY_LIFETIME_HOURS: i64 = 24;

/// Default nearby-search radius in kilometers.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

/// An ephemeral image post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image: String,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub likes_count: i32,
    pub views_count: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Story {
    /// Expiry timestamp for a story created at `created_at`.
    pub fn expiry_for(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::hours(STORY_LIFETIME_HOURS)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Story plus the requester's interaction flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    #[serde(flatten)]
    pub story: Story,
    pub liked_by_me: bool,
    pub viewed_by_me: bool,
}

/// Request payload for posting a story.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    #[validate(length(min = 1, message = "Image is required"))]
    pub image: String,

    #[validate(length(max = 100, message = "Location name must be at most 100 characters"))]
    pub location_name: Option<String>,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: Option<f64>,
}

impl CreateStoryRequest {
    /// Returns the posting coordinates. Latitude and longitude must be given
    /// together; a lone value is an error.
    pub fn coordinates(&self) -> Result<Option<(f64, f64)>, &'static str> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Ok(Some((lat, lon))),
            (None, None) => Ok(None),
            _ => Err("Latitude and longitude must be provided together"),
        }
    }

    /// Location name with surrounding whitespace removed; blank becomes `None`.
    pub fn trimmed_location_name(&self) -> Option<String> {
        self.location_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Query parameters for `GET /api/stories/nearby`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_radius_km"))]
    pub radius: Option<f64>,
}

impl NearbyQuery {
    pub fn radius_km(&self) -> f64 {
        self.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_KM)
    }
}

/// One entry of a nearby-stories result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyStory {
    pub story: Story,
    pub user: UserSummary,
    pub distance_km: f64,
}

/// Active stories of one followed user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStories {
    pub user: UserSummary,
    pub stories: Vec<StoryResponse>,
}

/// Outcome of recording a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResult {
    pub counted: bool,
    pub views_count: i32,
}

/// Outcome of a like or unlike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResult {
    pub liked: bool,
    pub likes_count: i32,
}
