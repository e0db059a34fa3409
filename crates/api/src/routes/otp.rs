//! OTP send, verify and resend.

use axum::{extract::State, Json};
use domain::models::otp::{OtpSentResponse, OtpVerifiedResponse, SendOtpRequest, VerifyOtpRequest};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::routes::{ok, ApiResponse};
use crate::services::otp::{OtpError, OtpService};

fn service(state: &AppState) -> OtpService {
    OtpService::new(state.pool.clone(), state.sms.clone(), state.config.otp.clone())
}

fn map_otp_error(err: OtpError) -> ApiError {
    match err {
        OtpError::MobileAlreadyRegistered => ApiError::Conflict(err.to_string()),
        OtpError::NotFound => ApiError::NotFound(err.to_string()),
        OtpError::Expired | OtpError::InvalidCode { .. } => ApiError::Validation(err.to_string()),
        OtpError::TooManyAttempts => ApiError::rate_limited(err.to_string(), None),
        OtpError::Delivery(e) => {
            tracing::error!(error = %e, "OTP delivery failed");
            ApiError::ServiceUnavailable("Unable to send OTP right now. Try again later".into())
        }
        OtpError::Database(e) => e.into(),
    }
}

/// POST /api/otp/send
pub async fn send_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<SendOtpRequest>,
) -> Result<Json<ApiResponse<OtpSentResponse>>, ApiError> {
    request.validate()?;

    let expires_in = service(&state)
        .send(&request.mobile)
        .await
        .map_err(map_otp_error)?;

    Ok(ok(OtpSentResponse {
        mobile: request.mobile,
        expires_in,
    }))
}

/// POST /api/otp/resend
pub async fn resend_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<SendOtpRequest>,
) -> Result<Json<ApiResponse<OtpSentResponse>>, ApiError> {
    request.validate()?;

    let expires_in = service(&state)
        .resend(&request.mobile)
        .await
        .map_err(map_otp_error)?;

    Ok(ok(OtpSentResponse {
        mobile: request.mobile,
        expires_in,
    }))
}

/// POST /api/otp/verify
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<OtpVerifiedResponse>>, ApiError> {
    request.validate()?;

    service(&state)
        .verify(&request.mobile, &request.code)
        .await
        .map_err(map_otp_error)?;

    Ok(ok(OtpVerifiedResponse {
        mobile: request.mobile,
        verified: true,
    }))
}
