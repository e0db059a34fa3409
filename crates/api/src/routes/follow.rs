//! Follow graph routes.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use domain::models::story::{StoryResponse, UserStories};
use domain::models::{FollowCounts, FollowStatus, UserSummary};
use persistence::repositories::{FollowRepository, StoryRepository, UserRepository};
use serde::Serialize;
use shared::pagination::{PageInfo, PageParams};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AppPath, AppQuery, UserAuth};
use crate::routes::{created, ok, ApiResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub following_id: Uuid,
    pub is_following: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub pagination: PageInfo,
}

async fn ensure_user_exists(state: &AppState, user_id: Uuid) -> Result<(), ApiError> {
    if UserRepository::new(state.pool.clone()).exists(user_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("User not found".into()))
    }
}

/// POST /api/follow/:userId
pub async fn follow_user(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<FollowResponse>>), ApiError> {
    if user_id == auth.user_id {
        return Err(ApiError::Validation("You cannot follow yourself".into()));
    }
    ensure_user_exists(&state, user_id).await?;

    let edge = FollowRepository::new(state.pool.clone())
        .follow(auth.user_id, user_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Already following this user".into()))?;

    tracing::info!(follower_id = %auth.user_id, following_id = %user_id, "User followed");

    Ok(created(FollowResponse {
        following_id: edge.following_id,
        is_following: true,
        followed_at: Some(edge.created_at),
    }))
}

/// DELETE /api/follow/:userId
pub async fn unfollow_user(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<FollowResponse>>, ApiError> {
    let removed = FollowRepository::new(state.pool.clone())
        .unfollow(auth.user_id, user_id)
        .await?;
    if !removed {
        return Err(ApiError::NotFound("You are not following this user".into()));
    }

    Ok(ok(FollowResponse {
        following_id: user_id,
        is_following: false,
        followed_at: None,
    }))
}

/// GET /api/follow/check/:userId
pub async fn check_follow(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<FollowStatus>>, ApiError> {
    let status = FollowRepository::new(state.pool.clone())
        .status(auth.user_id, user_id)
        .await?;
    Ok(ok(status.into()))
}

/// GET /api/follow/counts/:userId
pub async fn follow_counts(
    State(state): State<AppState>,
    _auth: UserAuth,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<FollowCounts>>, ApiError> {
    ensure_user_exists(&state, user_id).await?;
    let counts = FollowRepository::new(state.pool.clone())
        .counts(user_id)
        .await?;
    Ok(ok(counts.into()))
}

/// GET /api/follow/followers/:userId
pub async fn list_followers(
    State(state): State<AppState>,
    _auth: UserAuth,
    AppPath(user_id): AppPath<Uuid>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Json<ApiResponse<UserPage>>, ApiError> {
    ensure_user_exists(&state, user_id).await?;
    let repo = FollowRepository::new(state.pool.clone());

    let total = repo.counts(user_id).await?.followers;
    let users = repo
        .list_followers(user_id, params.limit(), params.offset())
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    Ok(ok(UserPage {
        users,
        pagination: PageInfo::new(&params, total),
    }))
}

/// GET /api/follow/following/:userId
pub async fn list_following(
    State(state): State<AppState>,
    _auth: UserAuth,
    AppPath(user_id): AppPath<Uuid>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Json<ApiResponse<UserPage>>, ApiError> {
    ensure_user_exists(&state, user_id).await?;
    let repo = FollowRepository::new(state.pool.clone());

    let total = repo.counts(user_id).await?.following;
    let users = repo
        .list_following(user_id, params.limit(), params.offset())
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    Ok(ok(UserPage {
        users,
        pagination: PageInfo::new(&params, total),
    }))
}

/// GET /api/follow/stories
///
/// Active stories of followed users, one group per author. Groups are
/// ordered by each author's newest story.
pub async fn following_stories(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<ApiResponse<Vec<UserStories>>>, ApiError> {
    let rows = StoryRepository::new(state.pool.clone())
        .following_feed(auth.user_id, Utc::now())
        .await?;

    let mut groups: Vec<UserStories> = Vec::new();
    for row in rows {
        let author = row.author();
        let story = StoryResponse {
            story: row.story.into(),
            liked_by_me: row.liked_by_me,
            viewed_by_me: row.viewed_by_me,
        };
        match groups.last_mut() {
            Some(group) if group.user.id == author.id => group.stories.push(story),
            _ => groups.push(UserStories {
                user: author,
                stories: vec![story],
            }),
        }
    }

    Ok(ok(groups))
}
