//! Profile routes under `/api/auth`.

use axum::{extract::State, Json};
use domain::models::user::{
    PublicProfile, SearchUsersQuery, UpdateCategoriesRequest, UpdateProfileRequest,
};
use domain::models::{User, UserSummary};
use persistence::repositories::{FollowRepository, ProfileChanges, UserRepository};
use shared::image::ImagePayload;
use shared::validation::{normalize_categories, normalize_instagram};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AppJson, AppPath, AppQuery, UserAuth};
use crate::routes::{ok, ApiResponse};

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".into())
}

/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(ok(user.into()))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: UserAuth,
    AppJson(request): AppJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    request.validate()?;
    if request.is_empty() {
        return Err(ApiError::Validation("No fields to update".into()));
    }

    let photo = match request.photo {
        Some(photo) => {
            ImagePayload::parse(&photo, state.config.limits.max_image_bytes)?;
            Some(photo.trim().to_string())
        }
        None => None,
    };

    let changes = ProfileChanges {
        name: request.name.map(|n| n.trim().to_string()),
        photo,
        gender: request.gender.map(|g| g.as_str().to_string()),
        instagram: request.instagram.as_deref().map(normalize_instagram),
        categories: request
            .categories
            .as_deref()
            .map(normalize_categories)
            .transpose()?,
    };

    let user = UserRepository::new(state.pool.clone())
        .update_profile(auth.user_id, &changes)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %auth.user_id, "Profile updated");
    Ok(ok(user.into()))
}

/// PUT /api/auth/categories
pub async fn update_categories(
    State(state): State<AppState>,
    auth: UserAuth,
    AppJson(request): AppJson<UpdateCategoriesRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    request.validate()?;
    let categories = normalize_categories(&request.categories)?;

    let user = UserRepository::new(state.pool.clone())
        .update_categories(auth.user_id, &categories)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(ok(user.into()))
}

/// GET /api/auth/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    auth: UserAuth,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<PublicProfile>>, ApiError> {
    let user: User = UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(user_not_found)?
        .into();

    let follows = FollowRepository::new(state.pool.clone());
    let counts = follows.counts(user_id).await?;
    let is_following = follows.is_following(auth.user_id, user_id).await?;

    Ok(ok(PublicProfile {
        id: user.id,
        name: user.name,
        photo: user.photo,
        gender: user.gender,
        categories: user.categories,
        instagram: user.instagram,
        followers_count: counts.followers,
        following_count: counts.following,
        is_following,
        created_at: user.created_at,
    }))
}

/// GET /api/auth/search?q=&limit=
pub async fn search_users(
    State(state): State<AppState>,
    auth: UserAuth,
    AppQuery(query): AppQuery<SearchUsersQuery>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    query.validate()?;
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ApiError::Validation(
            "Search query must be 1-50 characters".into(),
        ));
    }

    let users = UserRepository::new(state.pool.clone())
        .search(auth.user_id, q, query.effective_limit())
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(ok(users))
}
