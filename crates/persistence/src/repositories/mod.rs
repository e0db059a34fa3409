//! Repository implementations for database operations.

pub mod follow;
pub mod otp;
pub mod story;
pub mod user;

pub use follow::FollowRepository;
pub use otp::OtpRepository;
pub use story::{NewStory, StoryRepository};
pub use user::{NewUser, ProfileChanges, UserRepository};
