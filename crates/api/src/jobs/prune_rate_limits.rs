//! Forgets OTP rate-limit entries whose hourly quota has refilled.

use std::sync::Arc;

use super::scheduler::{Job, JobError, JobFrequency};
use crate::middleware::RateLimiterState;

pub struct PruneRateLimitsJob {
    limiter: Arc<RateLimiterState>,
}

impl PruneRateLimitsJob {
    pub fn new(limiter: Arc<RateLimiterState>) -> Self {
        Self { limiter }
    }
}

#[async_trait::async_trait]
impl Job for PruneRateLimitsJob {
    fn name(&self) -> &'static str {
        "prune_rate_limits"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(10)
    }

    async fn execute(&self) -> Result<(), JobError> {
        let remaining = self.limiter.prune();
        tracing::debug!(remaining, "Pruned OTP rate limiter");
        Ok(())
    }
}
