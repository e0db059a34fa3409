//! Common validation utilities.
//!
//! These functions plug into `validator` derive rules via
//! `#[validate(custom(function = "..."))]`.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum number of categories a profile may carry.
pub const MAX_CATEGORIES: usize = 8;
/// Maximum length of a single category label.
pub const MAX_CATEGORY_LEN: usize = 30;
/// Largest accepted nearby-search radius in kilometers.
pub const MAX_RADIUS_KM: f64 = 100.0;

lazy_static! {
    static ref MOBILE_REGEX: Regex = Regex::new(r"^\+?[0-9]{8,15}$").unwrap();
    static ref INSTAGRAM_REGEX: Regex = Regex::new(r"^[A-Za-z0-9._]{1,30}$").unwrap();
    static ref OTP_CODE_REGEX: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(error("latitude_range", "Latitude must be between -90 and 90"))
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(error(
            "longitude_range",
            "Longitude must be between -180 and 180",
        ))
    }
}

/// Validates a search radius in kilometers: strictly positive, at most 100.
pub fn validate_radius_km(radius: f64) -> Result<(), ValidationError> {
    if radius > 0.0 && radius <= MAX_RADIUS_KM {
        Ok(())
    } else {
        Err(error(
            "radius_range",
            "Radius must be greater than 0 and at most 100 km",
        ))
    }
}

/// Validates a phone number: optional leading `+`, then 8 to 15 digits.
pub fn validate_mobile(mobile: &str) -> Result<(), ValidationError> {
    if MOBILE_REGEX.is_match(mobile) {
        Ok(())
    } else {
        Err(error("mobile_format", "Invalid mobile number"))
    }
}

/// Validates a 6-digit OTP code.
pub fn validate_otp_code(code: &str) -> Result<(), ValidationError> {
    if OTP_CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        Err(error("otp_format", "OTP must be 6 digits"))
    }
}

/// Validates an Instagram handle, with or without a leading `@`.
pub fn validate_instagram(handle: &str) -> Result<(), ValidationError> {
    let handle = handle.strip_prefix('@').unwrap_or(handle);
    if INSTAGRAM_REGEX.is_match(handle) {
        Ok(())
    } else {
        Err(error("instagram_format", "Invalid Instagram handle"))
    }
}

/// Validates a category list and returns it trimmed and deduplicated,
/// preserving first-seen order.
pub fn normalize_categories(categories: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut out: Vec<String> = Vec::with_capacity(categories.len());
    for raw in categories {
        let category = raw.trim();
        if category.is_empty() || category.chars().count() > MAX_CATEGORY_LEN {
            return Err(error(
                "category_length",
                "Each category must be 1-30 characters",
            ));
        }
        if !out.iter().any(|c| c.eq_ignore_ascii_case(category)) {
            out.push(category.to_string());
        }
    }
    if out.len() > MAX_CATEGORIES {
        return Err(error(
            "category_count",
            "You can select at most 8 categories",
        ));
    }
    Ok(out)
}

/// Strips whitespace and a leading `@` from an Instagram handle.
pub fn normalize_instagram(handle: &str) -> String {
    let handle = handle.trim();
    handle.strip_prefix('@').unwrap_or(handle).to_string()
}
