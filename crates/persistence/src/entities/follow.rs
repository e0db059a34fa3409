//! Follow entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the follows table.
#[derive(Debug, Clone, FromRow)]
pub struct FollowEntity {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Follower/following totals for one user.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct FollowCountsEntity {
    pub followers: i64,
    pub following: i64,
}

impl From<FollowCountsEntity> for domain::models::FollowCounts {
    fn from(entity: FollowCountsEntity) -> Self {
        Self {
            followers: entity.followers,
            following: entity.following,
        }
    }
}

/// Both directions of the relationship between two users.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct FollowStatusEntity {
    pub is_following: bool,
    pub is_followed_by: bool,
}

impl From<FollowStatusEntity> for domain::models::FollowStatus {
    fn from(entity: FollowStatusEntity) -> Self {
        Self {
            is_following: entity.is_following,
            is_followed_by: entity.is_followed_by,
        }
    }
}
