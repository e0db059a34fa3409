//! One-time password domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A pending or verified phone verification code.
///
/// Only the SHA-256 digest of the code is kept.
#[derive(Debug, Clone)]
pub struct Otp {
    pub mobile: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl Otp {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Request payload for `send` and `resend`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[validate(custom(function = "shared::validation::validate_mobile"))]
    pub mobile: String,
}

/// Request payload for code verification.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(custom(function = "shared::validation::validate_mobile"))]
    pub mobile: String,

    #[validate(custom(function = "shared::validation::validate_otp_code"))]
    pub code: String,
}

/// Response after an OTP was issued.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSentResponse {
    pub mobile: String,
    pub expires_in: i64,
}

/// Response after a successful verification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifiedResponse {
    pub mobile: String,
    pub verified: bool,
}
