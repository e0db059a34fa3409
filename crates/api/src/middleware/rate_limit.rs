//! Per-mobile rate limiting for OTP delivery.
//!
//! Every OTP send or resend costs one cell from the number's hourly quota,
//! whether or not delivery succeeds.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter as GovRateLimiter,
};
use serde::Deserialize;
use shared::validation::validate_mobile;
use std::num::NonZeroU32;

use crate::app::AppState;
use crate::error::ApiError;

/// Body size the limiter is willing to buffer to find the mobile number.
const MAX_OTP_BODY_BYTES: usize = 4 * 1024;

/// Governor limiter keyed by mobile number.
pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<String>,
    per_hour: u32,
}

impl RateLimiterState {
    /// Returns `None` when `per_hour` is 0 (limit disabled).
    pub fn per_hour(per_hour: u32) -> Option<Self> {
        let cells = NonZeroU32::new(per_hour)?;
        Some(Self {
            limiter: GovRateLimiter::keyed(Quota::per_hour(cells)),
            per_hour,
        })
    }

    /// `Ok(())` when allowed, otherwise the seconds until the next cell frees up.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.limiter.check_key(&key.to_string()).map_err(|not_until| {
            not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1)
        })
    }

    /// Drops numbers whose quota has fully refilled. Returns how many remain.
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }

    pub fn tracked_numbers(&self) -> usize {
        self.limiter.len()
    }

    pub fn limit_per_hour(&self) -> u32 {
        self.per_hour
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("per_hour", &self.per_hour)
            .field("tracked_numbers", &self.tracked_numbers())
            .finish()
    }
}

#[derive(Deserialize)]
struct MobileField {
    mobile: String,
}

/// The mobile number to charge, if the body carries a well-formed one.
fn mobile_from_body(bytes: &Bytes) -> Option<String> {
    serde_json::from_slice::<MobileField>(bytes)
        .ok()
        .map(|m| m.mobile.trim().to_string())
        .filter(|m| validate_mobile(m).is_ok())
}

/// Route layer for the OTP send/resend endpoints.
///
/// Buffers the (small) JSON body to read `mobile`, charges that number's
/// quota and hands the body back to the handler untouched. Bodies without a
/// valid `mobile` are not charged and pass through so the handler can
/// reject them.
pub async fn otp_rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.otp_limiter.clone() else {
        return next.run(req).await;
    };

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_OTP_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return ApiError::Validation("Request body too large".into()).into_response();
        }
    };

    if let Some(mobile) = mobile_from_body(&bytes) {
        if let Err(retry_after) = limiter.check(&mobile) {
            tracing::warn!(retry_after, "OTP rate limit hit");
            crate::middleware::metrics::record_otp_rate_limited();
            return ApiError::rate_limited(
                format!(
                    "Too many OTP requests. Limit is {} per hour",
                    limiter.limit_per_hour()
                ),
                Some(retry_after),
            )
            .into_response();
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
