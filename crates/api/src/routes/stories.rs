//! Story routes.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use domain::models::story::{
    CreateStoryRequest, LikeResult, NearbyQuery, NearbyStory, StoryResponse, ViewResult,
};
use domain::models::user::UpdateLocationRequest;
use domain::models::{Story, User};
use domain::services::{rank_nearby, BoundingBox, Coordinates, StoryCandidate};
use persistence::repositories::{NewStory, StoryRepository, UserRepository};
use shared::image::ImagePayload;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AppJson, AppPath, AppQuery, UserAuth};
use crate::middleware::metrics::record_story_created;
use crate::routes::{created, ok, ApiResponse};

fn story_not_found() -> ApiError {
    ApiError::NotFound("Story not found".into())
}

/// Loads a story that is still live or fails with 404.
async fn active_story(repo: &StoryRepository, id: Uuid) -> Result<Story, ApiError> {
    repo.find_active(id, Utc::now())
        .await?
        .map(Story::from)
        .ok_or_else(story_not_found)
}

/// POST /api/stories
pub async fn create_story(
    State(state): State<AppState>,
    auth: UserAuth,
    AppJson(request): AppJson<CreateStoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StoryResponse>>), ApiError> {
    request.validate()?;
    let coordinates = request
        .coordinates()
        .map_err(|msg| ApiError::Validation(msg.into()))?;
    let payload = ImagePayload::parse(&request.image, state.config.limits.max_image_bytes)?;
    let location_name = request.trimmed_location_name();

    let created_at = Utc::now();
    let story: Story = StoryRepository::new(state.pool.clone())
        .create(NewStory {
            user_id: auth.user_id,
            image: request.image.trim(),
            location_name: location_name.as_deref(),
            coordinates,
            created_at,
            expires_at: Story::expiry_for(created_at),
        })
        .await?
        .into();

    record_story_created();
    tracing::info!(
        story_id = %story.id,
        user_id = %auth.user_id,
        inline_image = matches!(payload, ImagePayload::Inline { .. }),
        "Story created"
    );

    Ok(created(StoryResponse {
        story,
        liked_by_me: false,
        viewed_by_me: false,
    }))
}

/// GET /api/stories/me
pub async fn my_stories(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<ApiResponse<Vec<StoryResponse>>>, ApiError> {
    let stories = StoryRepository::new(state.pool.clone())
        .list_active_by_user(auth.user_id, auth.user_id, Utc::now())
        .await?
        .into_iter()
        .map(StoryResponse::from)
        .collect();
    Ok(ok(stories))
}

/// GET /api/stories/user/:userId
pub async fn user_stories(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<StoryResponse>>>, ApiError> {
    if !UserRepository::new(state.pool.clone()).exists(user_id).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    let stories = StoryRepository::new(state.pool.clone())
        .list_active_by_user(user_id, auth.user_id, Utc::now())
        .await?
        .into_iter()
        .map(StoryResponse::from)
        .collect();
    Ok(ok(stories))
}

/// GET /api/stories/:id
pub async fn get_story(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(story_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<StoryResponse>>, ApiError> {
    let story = StoryRepository::new(state.pool.clone())
        .find_active_for_viewer(story_id, auth.user_id, Utc::now())
        .await?
        .ok_or_else(story_not_found)?;
    Ok(ok(story.into()))
}

/// DELETE /api/stories/:id
pub async fn delete_story(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(story_id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = StoryRepository::new(state.pool.clone());
    let story = active_story(&repo, story_id).await?;

    if !story.is_owned_by(auth.user_id) {
        return Err(ApiError::Forbidden(
            "You can only delete your own stories".into(),
        ));
    }

    if !repo.delete(story_id).await? {
        return Err(story_not_found());
    }

    tracing::info!(story_id = %story_id, "Story deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/stories/:id/like
pub async fn like_story(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(story_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<LikeResult>>, ApiError> {
    let repo = StoryRepository::new(state.pool.clone());
    active_story(&repo, story_id).await?;

    let likes_count = repo
        .like(story_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Story already liked".into()))?;

    Ok(ok(LikeResult {
        liked: true,
        likes_count,
    }))
}

/// DELETE /api/stories/:id/like
pub async fn unlike_story(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(story_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<LikeResult>>, ApiError> {
    let repo = StoryRepository::new(state.pool.clone());
    active_story(&repo, story_id).await?;

    let likes_count = repo
        .unlike(story_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Story not liked".into()))?;

    Ok(ok(LikeResult {
        liked: false,
        likes_count,
    }))
}

/// POST /api/stories/:id/view
///
/// Owners viewing their own story are not counted.
pub async fn view_story(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(story_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<ViewResult>>, ApiError> {
    let repo = StoryRepository::new(state.pool.clone());
    let story = active_story(&repo, story_id).await?;

    if story.is_owned_by(auth.user_id) {
        return Ok(ok(ViewResult {
            counted: false,
            views_count: story.views_count,
        }));
    }

    let (counted, views_count) = repo.record_view(story_id, auth.user_id).await?;
    Ok(ok(ViewResult {
        counted,
        views_count,
    }))
}

/// GET /api/stories/nearby?latitude=&longitude=&radius=
pub async fn nearby_stories(
    State(state): State<AppState>,
    auth: UserAuth,
    AppQuery(query): AppQuery<NearbyQuery>,
) -> Result<Json<ApiResponse<Vec<NearbyStory>>>, ApiError> {
    query.validate()?;

    let origin = Coordinates::new(query.latitude, query.longitude);
    let radius_km = query.radius_km();
    let bbox = BoundingBox::around(origin, radius_km);
    let now = Utc::now();

    let candidates: Vec<StoryCandidate> = StoryRepository::new(state.pool.clone())
        .nearby_candidates(&bbox, auth.user_id, now)
        .await?
        .into_iter()
        .map(StoryCandidate::from)
        .collect();
    let scanned = candidates.len();

    let nearby = rank_nearby(origin, radius_km, auth.user_id, candidates, now);
    tracing::debug!(scanned, returned = nearby.len(), radius_km, "Nearby stories");

    Ok(ok(nearby))
}

/// PUT /api/stories/location
pub async fn update_location(
    State(state): State<AppState>,
    auth: UserAuth,
    AppJson(request): AppJson<UpdateLocationRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    request.validate()?;

    let user = UserRepository::new(state.pool.clone())
        .update_location(auth.user_id, request.latitude, request.longitude, Utc::now())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(ok(user.into()))
}
