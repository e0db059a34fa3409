use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, otp_rate_limit_middleware, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{auth, follow, health, otp, profile, stories};
use crate::services::sms::{SmsError, SmsSender};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    /// Per-mobile limiter for OTP sends; `None` disables the limit.
    pub otp_limiter: Option<Arc<RateLimiterState>>,
    pub sms: Arc<dyn SmsSender>,
}

/// Errors that prevent the router from being built.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid JWT configuration: {0}")]
    Jwt(#[from] JwtError),

    #[error("Invalid SMS configuration: {0}")]
    Sms(#[from] SmsError),
}

/// Builds the full router around a caller-supplied SMS sender.
pub fn create_app_with_sms(
    config: Config,
    pool: PgPool,
    sms: Arc<dyn SmsSender>,
) -> Result<Router, StartupError> {
    Ok(build_router(AppState::new(config, pool, sms)?))
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, sms: Arc<dyn SmsSender>) -> Result<Self, StartupError> {
        let jwt = JwtConfig::from_secret(
            &config.jwt.secret,
            config.jwt.token_expiry_secs,
            config.jwt.leeway_secs,
        )?;

        let otp_limiter =
            RateLimiterState::per_hour(config.security.otp_rate_limit_per_hour).map(Arc::new);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            otp_limiter,
            sms,
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::liveness))
        .route("/api/health/ready", get(health::readiness))
        .route("/metrics", get(metrics_handler))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/otp/verify", post(otp::verify_otp));

    // Limited per mobile number; rejected requests never reach the handler.
    let otp_send_routes = Router::new()
        .route("/api/otp/send", post(otp::send_otp))
        .route("/api/otp/resend", post(otp::resend_otp))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            otp_rate_limit_middleware,
        ));

    let protected_routes = Router::new()
        // Profile
        .route(
            "/api/auth/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api/auth/categories", put(profile::update_categories))
        .route("/api/auth/users/:id", get(profile::get_user))
        .route("/api/auth/search", get(profile::search_users))
        // Stories
        .route("/api/stories", post(stories::create_story))
        .route("/api/stories/me", get(stories::my_stories))
        .route("/api/stories/nearby", get(stories::nearby_stories))
        .route("/api/stories/location", put(stories::update_location))
        .route("/api/stories/user/:user_id", get(stories::user_stories))
        .route(
            "/api/stories/:id",
            get(stories::get_story).delete(stories::delete_story),
        )
        .route(
            "/api/stories/:id/like",
            post(stories::like_story).delete(stories::unlike_story),
        )
        .route("/api/stories/:id/view", post(stories::view_story))
        // Follow graph
        .route("/api/follow/stories", get(follow::following_stories))
        .route("/api/follow/check/:user_id", get(follow::check_follow))
        .route("/api/follow/counts/:user_id", get(follow::follow_counts))
        .route("/api/follow/followers/:user_id", get(follow::list_followers))
        .route("/api/follow/following/:user_id", get(follow::list_following))
        .route(
            "/api/follow/:user_id",
            post(follow::follow_user).delete(follow::unfollow_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(otp_send_routes)
        .merge(protected_routes)
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            config.security.hsts_enabled,
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}
