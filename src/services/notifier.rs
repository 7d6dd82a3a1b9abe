//! Outbound alert delivery.
//!
//! The notifier is built once at start-up from the secrets in [`Settings`]
//! and handed to every cycle; nothing here is process-global.
//!
//! [`Settings`]: crate::config::settings::Settings

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::utils::errors::DeliveryError;

pub const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text` to the one configured destination.
    async fn send(&self, text: &str) -> Result<(), DeliveryError>;
}

/// Telegram Bot API `sendMessage` client.
pub struct TelegramNotifier {
    http:     Client,
    base_url: String,
    token:    Zeroizing<String>,
    chat_id:  String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text:    &'a str,
}

/// Only the fields we look at.
#[derive(Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(
        base_url: impl Into<String>,
        token: Zeroizing<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            chat_id: chat_id.into(),
        })
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        let url = Zeroizing::new(format!("{}/bot{}/sendMessage", self.base_url, self.token.as_str()));

        let resp = self
            .http
            .post(url.as_str())
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.bytes().await?;
        let reply = serde_json::from_slice::<TelegramReply>(&raw).ok();

        match reply {
            Some(r) if status.is_success() && r.ok => {
                log::debug!("telegram: message delivered to chat {}", self.chat_id);
                Ok(())
            }
            other => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: other
                    .and_then(|r| r.description)
                    .unwrap_or_else(|| {
                        status
                            .canonical_reason()
                            .unwrap_or("unexpected reply")
                            .to_string()
                    }),
            }),
        }
    }
}
