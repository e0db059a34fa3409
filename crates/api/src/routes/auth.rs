//! Signup and signin.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::user::{SigninRequest, SignupRequest};
use domain::models::User;
use serde::Serialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::middleware::metrics::{record_signin, record_signup};
use crate::routes::{created, ok, ApiResponse};
use crate::services::auth::{AuthError, AuthResult, AuthService};

/// Body returned by signup and signin.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            user: result.user,
            token: result.token.token,
            token_type: "Bearer",
            expires_in: result.token.expires_in,
        }
    }
}

fn map_auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::EmailAlreadyExists | AuthError::MobileAlreadyExists => {
            ApiError::Conflict(err.to_string())
        }
        AuthError::MobileNotVerified
        | AuthError::WeakPassword(_)
        | AuthError::InvalidInput(_)
        | AuthError::MissingIdentifier => ApiError::Validation(err.to_string()),
        AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
        AuthError::DatabaseError(e) => e.into(),
        AuthError::TokenError(_) | AuthError::PasswordError(_) => {
            ApiError::Internal(err.to_string())
        }
    }
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let result = service.signup(request).await.map_err(map_auth_error)?;
    record_signup();

    Ok(created(AuthResponse::from(result)))
}

/// POST /api/auth/signin
pub async fn signin(
    State(state): State<AppState>,
    AppJson(request): AppJson<SigninRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let result = service.signin(request).await.map_err(|e| {
        if matches!(e, AuthError::InvalidCredentials) {
            record_signin(false);
        }
        map_auth_error(e)
    })?;
    record_signin(true);

    Ok(ok(AuthResponse::from(result)))
}
