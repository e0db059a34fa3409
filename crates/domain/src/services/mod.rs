//! Domain services for Sawa.
//!
//! Services contain business logic that operates on domain models.

pub mod proximity;

pub use proximity::{haversine_km, rank_nearby, BoundingBox, Coordinates, StoryCandidate};
