//! SMS delivery for OTP codes.
//!
//! Providers:
//! - `console`: logs the message (development)
//! - `http`: POSTs `{to, from, message}` JSON to a gateway
//!
//! With `sms.enabled = false` every send fails with [`SmsError::Disabled`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SmsConfig;

/// Errors that can occur while delivering an SMS.
#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS delivery disabled")]
    Disabled,

    #[error("Unknown SMS provider: {0}")]
    UnknownProvider(String),

    #[error("SMS gateway timed out after {0}ms")]
    Timeout(u64),

    #[error("SMS gateway rejected the message: {0}")]
    Rejected(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Something that can deliver a text message to a phone number.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Short provider label used in logs and metrics.
    fn provider(&self) -> &'static str;

    async fn send(&self, to: &str, message: &str) -> Result<(), SmsError>;
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct ConsoleSms;

#[async_trait]
impl SmsSender for ConsoleSms {
    fn provider(&self) -> &'static str {
        "console"
    }

    async fn send(&self, to: &str, message: &str) -> Result<(), SmsError> {
        info!(to = %to, message = %message, "SMS (console provider)");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DisabledSms;

#[async_trait]
impl SmsSender for DisabledSms {
    fn provider(&self) -> &'static str {
        "disabled"
    }

    async fn send(&self, to: &str, _message: &str) -> Result<(), SmsError> {
        debug!(to = %to, "SMS delivery disabled, dropping message");
        Err(SmsError::Disabled)
    }
}

#[derive(Debug, Serialize)]
struct GatewayMessage<'a> {
    to: &'a str,
    from: &'a str,
    message: &'a str,
}

/// Generic JSON-over-HTTP gateway.
pub struct HttpSms {
    client: Client,
    url: String,
    api_key: Option<String>,
    sender_id: String,
    timeout_ms: u64,
}

impl HttpSms {
    pub fn new(config: &SmsConfig) -> Result<Self, SmsError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            url: config.gateway_url.clone(),
            api_key: Some(config.api_key.clone()).filter(|k| !k.is_empty()),
            sender_id: config.sender_id.clone(),
            timeout_ms: config.timeout_ms,
        })
    }
}

#[async_trait]
impl SmsSender for HttpSms {
    fn provider(&self) -> &'static str {
        "http"
    }

    async fn send(&self, to: &str, message: &str) -> Result<(), SmsError> {
        let mut request = self.client.post(&self.url).json(&GatewayMessage {
            to,
            from: &self.sender_id,
            message,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SmsError::Timeout(self.timeout_ms)
            } else {
                SmsError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "SMS gateway returned an error");
            return Err(SmsError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        debug!(to = %to, "SMS accepted by gateway");
        Ok(())
    }
}

/// Builds the sender selected by `sms.provider`.
pub fn build_sms_sender(config: &SmsConfig) -> Result<Arc<dyn SmsSender>, SmsError> {
    if !config.enabled {
        return Ok(Arc::new(DisabledSms));
    }

    match config.provider.as_str() {
        "console" => Ok(Arc::new(ConsoleSms)),
        "http" => Ok(Arc::new(HttpSms::new(config)?)),
        other => Err(SmsError::UnknownProvider(other.to_string())),
    }
}

/// Body of the verification text.
pub fn otp_message(code: &str, expiry_minutes: i64) -> String {
    format!(
        "Your Sawa verification code is {}. It expires in {} minutes.",
        code, expiry_minutes
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> SmsConfig {
        SmsConfig {
            provider: provider.to_string(),
            gateway_url: "http://127.0.0.1:9/send".to_string(),
            ..SmsConfig::default()
        }
    }

    #[test]
    fn test_build_known_providers() {
        assert_eq!(build_sms_sender(&config("console")).unwrap().provider(), "console");
        assert_eq!(build_sms_sender(&config("http")).unwrap().provider(), "http");
    }

    #[test]
    fn test_build_unknown_provider() {
        assert!(matches!(
            build_sms_sender(&config("carrier-pigeon")),
            Err(SmsError::UnknownProvider(p)) if p == "carrier-pigeon"
        ));
    }

    #[test]
    fn test_disabled_ignores_provider() {
        let mut cfg = config("carrier-pigeon");
        cfg.enabled = false;
        assert_eq!(build_sms_sender(&cfg).unwrap().provider(), "disabled");
    }

    #[tokio::test]
    async fn test_console_send_succeeds() {
        assert!(ConsoleSms.send("+966500000000", "hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_send_fails() {
        assert!(matches!(
            DisabledSms.send("+966500000000", "hello").await,
            Err(SmsError::Disabled)
        ));
    }

    #[tokio::test]
    async fn test_http_send_unreachable_gateway() {
        let sender = HttpSms::new(&config("http")).unwrap();
        assert!(sender.send("+966500000000", "hello").await.is_err());
    }

    #[test]
    fn test_otp_message() {
        let message = otp_message("042137", 10);
        assert!(message.contains("042137"));
        assert!(message.contains("10 minutes"));
    }
}
