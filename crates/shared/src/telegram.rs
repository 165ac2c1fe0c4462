use std::io::Write;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Telegram API returned an error
    #[error("Telegram API error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to write message: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for formatted digest messages
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), DeliveryError>;
}

/// Telegram Bot API client bound to a single chat
pub struct TelegramClient {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }
}

#[async_trait]
impl DeliverySink for TelegramClient {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let resp = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML"
            }))
            .send()
            .await
            // the bot token is part of the URL
            .map_err(|e| e.without_url())?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Api { status, body });
        }

        Ok(())
    }
}

/// Prints messages instead of sending them, for dry runs
pub struct StdoutSink;

#[async_trait]
impl DeliverySink for StdoutSink {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}\n{}", text, "-".repeat(40))?;
        Ok(())
    }
}
