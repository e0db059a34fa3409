//! Account creation and signin.

use domain::models::user::{SigninIdentifier, SigninRequest, SignupRequest};
use domain::models::User;
use persistence::repositories::{NewUser, UserRepository};
use shared::jwt::{IssuedToken, JwtConfig, JwtError};
use shared::password::{check_policy, hash_password, verify_password, PasswordError};
use shared::validation::normalize_categories;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Mobile number already registered")]
    MobileAlreadyExists,

    #[error("Mobile number not verified")]
    MobileNotVerified,

    #[error("{0}")]
    WeakPassword(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Provide either email or mobile")]
    MissingIdentifier,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Policy(msg) => AuthError::WeakPassword(msg),
            other => AuthError::PasswordError(other),
        }
    }
}

/// A signed-in user and their fresh token.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub token: IssuedToken,
}

pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    /// Registers a user whose mobile number has a verified OTP.
    ///
    /// The user insert and the OTP deletion commit together, so an OTP
    /// verification can back at most one account.
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResult, AuthError> {
        check_policy(&request.password)?;

        let email = request.email.trim().to_lowercase();
        let mobile = request.mobile.trim().to_string();
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AuthError::InvalidInput("Name is required".into()));
        }
        let categories = normalize_categories(&request.categories).map_err(|e| {
            AuthError::InvalidInput(
                e.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid categories".into()),
            )
        })?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }
        if self.users.mobile_exists(&mobile).await? {
            return Err(AuthError::MobileAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;

        let entity = self
            .users
            .create_with_verified_otp(NewUser {
                email: &email,
                mobile: &mobile,
                password_hash: &password_hash,
                name: &name,
                gender: request.gender.map(|g| g.as_str()),
                categories: &categories,
            })
            .await?
            .ok_or(AuthError::MobileNotVerified)?;

        let user: User = entity.into();
        let token = self.jwt.issue(user.id)?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthResult { user, token })
    }

    /// Checks credentials against the account found by email or mobile.
    pub async fn signin(&self, request: SigninRequest) -> Result<AuthResult, AuthError> {
        let entity = match request.identifier().ok_or(AuthError::MissingIdentifier)? {
            SigninIdentifier::Email(email) => self.users.find_by_email(&email).await?,
            SigninIdentifier::Mobile(mobile) => self.users.find_by_mobile(&mobile).await?,
        };

        let Some(entity) = entity else {
            // Same cost as a real check so unknown accounts are not distinguishable by timing.
            let _ = hash_password(&request.password);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&request.password, &entity.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let user: User = entity.into();
        let token = self.jwt.issue(user.id)?;

        tracing::info!(user_id = %user.id, jti = %token.jti, "User signed in");

        Ok(AuthResult { user, token })
    }
}
