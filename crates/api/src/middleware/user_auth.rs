//! Bearer token authentication.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Identity carried by a validated access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub jti: String,
}

impl AuthenticatedUser {
    /// Validates `token` and resolves its subject.
    pub fn from_token(jwt: &JwtConfig, token: &str) -> Result<Self, ApiError> {
        let claims = jwt.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            match e {
                JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".into()),
                _ => ApiError::Unauthorized("Invalid or expired token".into()),
            }
        })?;
        let user_id = extract_user_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

        Ok(Self {
            user_id,
            jti: claims.jti,
        })
    }

    /// Reads `Authorization: Bearer <token>` from `headers` and validates it.
    pub fn from_headers(jwt: &JwtConfig, headers: &HeaderMap) -> Result<Self, ApiError> {
        let bearer = headers
            .typed_get::<Authorization<Bearer>>()
            .ok_or_else(|| {
                ApiError::Unauthorized("Missing or invalid Authorization header".into())
            })?;
        Self::from_token(jwt, bearer.token())
    }
}

/// Rejects requests without a valid bearer token and stores the
/// [`AuthenticatedUser`] in request extensions for handlers.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match AuthenticatedUser::from_headers(&state.jwt, req.headers()) {
        Ok(user) => {
            tracing::debug!(user_id = %user.user_id, "Request authenticated");
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}
