//! Background job scheduler and job implementations.

mod cleanup_expired;
mod pool_metrics;
mod prune_rate_limits;
mod scheduler;

pub use cleanup_expired::CleanupExpiredJob;
pub use pool_metrics::PoolMetricsJob;
pub use prune_rate_limits::PruneRateLimitsJob;
pub use scheduler::{Job, JobError, JobFrequency, JobScheduler};
