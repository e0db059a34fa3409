//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use domain::models::{Gender, User, UserSummary};

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub mobile: String,
    pub password_hash: String,
    pub name: String,
    pub photo: Option<String>,
    pub gender: Option<String>,
    pub categories: Vec<String>,
    pub instagram: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            mobile: entity.mobile,
            password_hash: entity.password_hash,
            name: entity.name,
            photo: entity.photo,
            gender: entity.gender.as_deref().and_then(|g| Gender::from_str(g).ok()),
            categories: entity.categories,
            instagram: entity.instagram,
            latitude: entity.latitude,
            longitude: entity.longitude,
            location_updated_at: entity.location_updated_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Narrow projection used in listings.
#[derive(Debug, Clone, FromRow)]
pub struct UserSummaryEntity {
    pub id: Uuid,
    pub name: String,
    pub photo: Option<String>,
    pub instagram: Option<String>,
}

impl From<UserSummaryEntity> for UserSummary {
    fn from(entity: UserSummaryEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            photo: entity.photo,
            instagram: entity.instagram,
        }
    }
}
