//! Domain models for Sawa.

pub mod follow;
pub mod otp;
pub mod story;
pub mod user;

pub use follow::{FollowCounts, FollowStatus};
pub use otp::Otp;
pub use story::Story;
pub use user::{Gender, User, UserSummary};
