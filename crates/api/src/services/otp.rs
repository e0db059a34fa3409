//! Phone verification codes.
//!
//! A code lives in the `otps` row keyed by mobile. Sending replaces the row,
//! verifying flips `verified`, and signup consumes it.

use chrono::{DateTime, Duration, Utc};
use domain::models::Otp;
use persistence::repositories::{OtpRepository, UserRepository};
use shared::crypto::{digests_match, generate_otp_code, hash_otp};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

use crate::config::OtpConfig;
use crate::services::sms::{otp_message, SmsError, SmsSender};

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Mobile number already registered")]
    MobileAlreadyRegistered,

    #[error("No OTP found for this mobile number")]
    NotFound,

    #[error("OTP expired")]
    Expired,

    #[error("Invalid OTP. {remaining} attempt(s) remaining")]
    InvalidCode { remaining: i32 },

    #[error("Too many failed attempts. Request a new OTP")]
    TooManyAttempts,

    #[error("Failed to deliver OTP: {0}")]
    Delivery(#[from] SmsError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of checking a submitted code against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    AlreadyVerified,
    Locked,
    Expired,
    Match,
    Mismatch,
}

/// Decides what a verification attempt does, without touching storage.
pub fn check_code(otp: &Otp, code: &str, max_attempts: i32, now: DateTime<Utc>) -> CodeCheck {
    let matches = digests_match(&otp.code_hash, &hash_otp(&otp.mobile, code));

    if otp.verified && matches {
        return CodeCheck::AlreadyVerified;
    }
    if otp.attempts >= max_attempts {
        return CodeCheck::Locked;
    }
    if otp.is_expired_at(now) {
        return CodeCheck::Expired;
    }
    if matches {
        CodeCheck::Match
    } else {
        CodeCheck::Mismatch
    }
}

pub struct OtpService {
    otps: OtpRepository,
    users: UserRepository,
    sms: Arc<dyn SmsSender>,
    config: OtpConfig,
}

impl OtpService {
    pub fn new(pool: PgPool, sms: Arc<dyn SmsSender>, config: OtpConfig) -> Self {
        Self {
            otps: OtpRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            sms,
            config,
        }
    }

    /// Issues a fresh code for an unregistered number and texts it.
    ///
    /// Returns the code lifetime in seconds. If delivery fails the row is
    /// kept so a resend can replace it.
    pub async fn send(&self, mobile: &str) -> Result<i64, OtpError> {
        if self.users.mobile_exists(mobile).await? {
            return Err(OtpError::MobileAlreadyRegistered);
        }

        let code = generate_otp_code();
        let expires_at = Utc::now() + Duration::seconds(self.config.expiry_secs);
        self.otps
            .upsert(mobile, &hash_otp(mobile, &code), expires_at)
            .await?;

        let message = otp_message(&code, (self.config.expiry_secs + 59) / 60);
        if let Err(e) = self.sms.send(mobile, &message).await {
            tracing::warn!(provider = self.sms.provider(), error = %e, "OTP delivery failed");
            return Err(e.into());
        }

        crate::middleware::metrics::record_otp_sent(self.sms.provider());
        tracing::info!(provider = self.sms.provider(), "OTP sent");

        Ok(self.config.expiry_secs)
    }

    /// Drops any existing code and sends a new one.
    pub async fn resend(&self, mobile: &str) -> Result<i64, OtpError> {
        if self.otps.delete(mobile).await? {
            tracing::debug!("Previous OTP discarded");
        }
        self.send(mobile).await
    }

    /// Checks `code` and marks the number verified on a match.
    ///
    /// Both writes are conditional on the row still being unlocked, so a
    /// burst of parallel guesses gets at most `max_attempts` evaluations.
    pub async fn verify(&self, mobile: &str, code: &str) -> Result<(), OtpError> {
        let max_attempts = self.config.max_attempts;
        let otp = self.load(mobile).await?;

        match check_code(&otp, code, max_attempts, Utc::now()) {
            CodeCheck::AlreadyVerified => Ok(()),
            CodeCheck::Locked => Err(OtpError::TooManyAttempts),
            CodeCheck::Expired => Err(OtpError::Expired),
            CodeCheck::Match => {
                if self
                    .otps
                    .mark_verified(mobile, &otp.code_hash, max_attempts)
                    .await?
                {
                    tracing::info!("Mobile number verified");
                    Ok(())
                } else {
                    self.settle(mobile, code).await
                }
            }
            CodeCheck::Mismatch => {
                match self.otps.increment_attempts(mobile, max_attempts).await? {
                    Some(attempts) => Err(OtpError::InvalidCode {
                        remaining: (max_attempts - attempts).max(0),
                    }),
                    None => self.settle(mobile, code).await,
                }
            }
        }
    }

    async fn load(&self, mobile: &str) -> Result<Otp, OtpError> {
        self.otps
            .find(mobile)
            .await?
            .map(Otp::from)
            .ok_or(OtpError::NotFound)
    }

    /// Re-reads a row whose conditional write matched nothing (another
    /// request locked, verified or replaced it) and reports its current state
    /// without writing.
    async fn settle(&self, mobile: &str, code: &str) -> Result<(), OtpError> {
        let max_attempts = self.config.max_attempts;
        let otp = self.load(mobile).await?;

        match check_code(&otp, code, max_attempts, Utc::now()) {
            CodeCheck::AlreadyVerified => Ok(()),
            CodeCheck::Locked => Err(OtpError::TooManyAttempts),
            // the database clock already saw it expire
            CodeCheck::Expired | CodeCheck::Match => Err(OtpError::Expired),
            CodeCheck::Mismatch => Err(OtpError::InvalidCode {
                remaining: (max_attempts - otp.attempts).max(0),
            }),
        }
    }
}
