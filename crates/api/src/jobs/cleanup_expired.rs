//! Sweeps expired stories and stale OTP rows.

use chrono::{Duration, Utc};
use persistence::metrics::record_rows_purged;
use persistence::repositories::{OtpRepository, StoryRepository};
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobError, JobFrequency};

pub struct CleanupExpiredJob {
    stories: StoryRepository,
    otps: OtpRepository,
    otp_retention: Duration,
}

impl CleanupExpiredJob {
    /// Unverified OTPs are kept for `otp_retention_hours` past expiry.
    pub fn new(pool: PgPool, otp_retention_hours: i64) -> Self {
        Self {
            stories: StoryRepository::new(pool.clone()),
            otps: OtpRepository::new(pool),
            otp_retention: Duration::hours(otp_retention_hours.max(0)),
        }
    }
}

#[async_trait::async_trait]
impl Job for CleanupExpiredJob {
    fn name(&self) -> &'static str {
        "cleanup_expired"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    fn run_on_start(&self) -> bool {
        true
    }

    async fn execute(&self) -> Result<(), JobError> {
        let now = Utc::now();

        let stories = self.stories.delete_expired(now).await?;
        record_rows_purged("stories", stories);

        let otps = self.otps.delete_stale(now - self.otp_retention).await?;
        record_rows_purged("otps", otps);

        if stories > 0 || otps > 0 {
            info!(stories, otps, "Purged expired rows");
        }
        Ok(())
    }
}
