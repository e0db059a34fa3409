//! Custom Axum extractors.

pub mod json;
pub mod user_auth;

pub use json::{AppJson, AppPath, AppQuery};
pub use user_auth::UserAuth;
