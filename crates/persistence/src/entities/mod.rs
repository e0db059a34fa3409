//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod follow;
pub mod otp;
pub mod story;
pub mod user;

pub use follow::{FollowCountsEntity, FollowEntity, FollowStatusEntity};
pub use otp::OtpEntity;
pub use story::{FeedStoryEntity, NearbyCandidateEntity, StoryEntity, StoryWithFlagsEntity};
pub use user::{UserEntity, UserSummaryEntity};
