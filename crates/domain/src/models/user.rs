//! User domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Self-reported gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub mobile: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub photo: Option<String>,
    pub gender: Option<Gender>,
    pub categories: Vec<String>,
    pub instagram: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal user card embedded in story and follow listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub photo: Option<String>,
    pub instagram: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            photo: user.photo.clone(),
            instagram: user.instagram.clone(),
        }
    }
}

/// Another user's profile as seen by the requester.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub photo: Option<String>,
    pub gender: Option<Gender>,
    pub categories: Vec<String>,
    pub instagram: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool,
    pub created_at: DateTime<Utc>,
}

/// Request payload for account creation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    #[validate(custom(function = "shared::validation::validate_mobile"))]
    pub mobile: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    pub gender: Option<Gender>,

    #[serde(default)]
    #[validate(length(max = 8, message = "You can select at most 8 categories"))]
    pub categories: Vec<String>,
}

/// Request payload for signin. Exactly one of `email` / `mobile` is expected.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = "shared::validation::validate_mobile"))]
    pub mobile: Option<String>,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Identifier a signin request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigninIdentifier {
    Email(String),
    Mobile(String),
}

impl SigninRequest {
    /// Returns the identifier to look the account up by, or `None` when
    /// neither or both were supplied.
    pub fn identifier(&self) -> Option<SigninIdentifier> {
        match (&self.email, &self.mobile) {
            (Some(email), None) => Some(SigninIdentifier::Email(email.trim().to_lowercase())),
            (None, Some(mobile)) => Some(SigninIdentifier::Mobile(mobile.trim().to_string())),
            _ => None,
        }
    }
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    pub photo: Option<String>,

    pub gender: Option<Gender>,

    #[validate(custom(function = "shared::validation::validate_instagram"))]
    pub instagram: Option<String>,

    #[validate(length(max = 8, message = "You can select at most 8 categories"))]
    pub categories: Option<Vec<String>>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.photo.is_none()
            && self.gender.is_none()
            && self.instagram.is_none()
            && self.categories.is_none()
    }
}

/// Replaces the category list.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoriesRequest {
    #[validate(length(min = 1, max = 8, message = "Select between 1 and 8 categories"))]
    pub categories: Vec<String>,
}

/// Query parameters for user search.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsersQuery {
    #[validate(length(min = 1, max = 50, message = "Search query must be 1-50 characters"))]
    pub q: String,
    pub limit: Option<i64>,
}

impl SearchUsersQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 50;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

/// Stores the requester's current position.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,
}
