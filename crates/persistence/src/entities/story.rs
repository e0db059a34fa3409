//! Story entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::story::{Story, StoryResponse};
use domain::models::UserSummary;
use domain::services::{Coordinates, StoryCandidate};

/// Database row mapping for the stories table.
#[derive(Debug, Clone, FromRow)]
pub struct StoryEntity {
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

impl From<StoryEntity> for Story {
    fn from(entity: StoryEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            image: entity.image,
            location_name: entity.location_name,
            latitude: entity.latitude,
            longitude: entity.longitude,
            likes_count: entity.likes_count,
            views_count: entity.views_count,
            created_at: entity.created_at,
            expires_at: entity.expires_at,
        }
    }
}

/// Story row with the viewer's like/view flags.
#[derive(Debug, Clone, FromRow)]
pub struct StoryWithFlagsEntity {
    #[sqlx(flatten)]
    pub story: StoryEntity,
    pub liked_by_me: bool,
    pub viewed_by_me: bool,
}

impl From<StoryWithFlagsEntity> for StoryResponse {
    fn from(entity: StoryWithFlagsEntity) -> Self {
        Self {
            story: entity.story.into(),
            liked_by_me: entity.liked_by_me,
            viewed_by_me: entity.viewed_by_me,
        }
    }
}

/// Story row joined with its author, used by the follow feed.
#[derive(Debug, Clone, FromRow)]
pub struct FeedStoryEntity {
    #[sqlx(flatten)]
    pub story: StoryEntity,
    pub liked_by_me: bool,
    pub viewed_by_me: bool,
    pub author_name: String,
    pub author_photo: Option<String>,
    pub author_instagram: Option<String>,
}

impl FeedStoryEntity {
    pub fn author(&self) -> UserSummary {
        UserSummary {
            id: self.story.user_id,
            name: self.author_name.clone(),
            photo: self.author_photo.clone(),
            instagram: self.author_instagram.clone(),
        }
    }
}

/// Result row of the bounding-box nearby query.
#[derive(Debug, Clone, FromRow)]
pub struct NearbyCandidateEntity {
    #[sqlx(flatten)]
    pub story: StoryEntity,
    pub author_name: String,
    pub author_photo: Option<String>,
    pub author_instagram: Option<String>,
    pub author_latitude: f64,
    pub author_longitude: f64,
}

impl From<NearbyCandidateEntity> for StoryCandidate {
    fn from(entity: NearbyCandidateEntity) -> Self {
        let user = UserSummary {
            id: entity.story.user_id,
            name: entity.author_name,
            photo: entity.author_photo,
            instagram: entity.author_instagram,
        };
        Self {
            story: entity.story.into(),
            user,
            user_location: Coordinates::new(entity.author_latitude, entity.author_longitude),
        }
    }
}
