//! Business services used by the route handlers.

pub mod auth;
pub mod otp;
pub mod sms;

pub use auth::AuthService;
pub use otp::OtpService;
pub use sms::{build_sms_sender, SmsSender};
