//! HTTP route handlers.

pub mod auth;
pub mod follow;
pub mod health;
pub mod otp;
pub mod profile;
pub mod stories;

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let Json(body) = ok(json!({"id": 1}));
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": true, "data": {"id": 1}})
        );
    }

    #[test]
    fn test_created_status() {
        let (status, _) = created("x");
        assert_eq!(status, StatusCode::CREATED);
    }
}
