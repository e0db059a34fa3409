//! Domain layer for the Sawa backend.
//!
//! This crate contains:
//! - Domain models (User, Otp, Story, Follow) and their request/response shapes
//! - The nearby-story proximity service (bounding box, Haversine, ranking)

pub mod models;
pub mod services;
