//! Telegram Bot API transport
//!
//! Long-polls `getUpdates` and answers with `sendMessage`. Transient HTTP
//! failures are retried with exponential back-off.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use super::{ChatTransport, IncomingMessage, PollBatch};
use crate::config::BotConfig;
use crate::{Result, VitalAirError};

/// Extra time on top of the long-poll timeout before the HTTP request gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

pub struct TelegramClient {
    client: ClientWithMiddleware,
    base_url: String,
}

/// Envelope every Bot API response uses
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

impl TelegramClient {
    /// Build a client from the bot settings. Fails without a token.
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| VitalAirError::config("TELEGRAM_BOT_TOKEN is not set"))?;
        Self::new(&config.api_base_url, token, config.poll_timeout_seconds, config.max_retries)
    }

    pub fn new(api_base_url: &str, token: &str, poll_timeout_seconds: u32, max_retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_seconds.into()) + POLL_GRACE)
            .user_agent(concat!("VitalAir/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VitalAirError::bot(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base_url.trim_end_matches('/'), token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn read_response<T: DeserializeOwned>(response: reqwest::Response, method: &str) -> Result<T> {
        let status = response.status();
        let body: ApiResponse<T> = response.json().await.map_err(|e| {
            VitalAirError::bot(format!("{method}: invalid response (HTTP {status}): {e}"))
        })?;

        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(VitalAirError::bot(format!(
                "{method} failed (HTTP {status}): {}",
                body.description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }
}

fn into_batch(updates: Vec<Update>) -> PollBatch {
    let next_offset = updates.iter().map(|u| u.update_id + 1).max();
    let messages = updates
        .into_iter()
        .filter_map(|update| {
            let message = update.message?;
            Some(IncomingMessage {
                chat_id: message.chat.id,
                text: message.text?,
            })
        })
        .collect();
    PollBatch {
        next_offset,
        messages,
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    #[instrument(skip(self))]
    async fn poll(&self, offset: i64, timeout_seconds: u32) -> Result<PollBatch> {
        let url = Url::parse_with_params(
            &self.method_url("getUpdates"),
            &[
                ("offset", offset.to_string()),
                ("timeout", timeout_seconds.to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ],
        )
        .map_err(|e| VitalAirError::bot(format!("Invalid Bot API URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VitalAirError::bot(format!("getUpdates request failed: {e}")))?;

        let updates: Vec<Update> = Self::read_response(response, "getUpdates").await?;
        debug!("Received {} updates", updates.len());

        Ok(into_batch(updates))
    }

    #[instrument(skip(self, text))]
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(|e| VitalAirError::bot(format!("sendMessage request failed: {e}")))?;

        if let Err(e) = Self::read_response::<serde_json::Value>(response, "sendMessage").await {
            warn!(chat_id, "Reply not delivered: {e}");
            return Err(e);
        }
        Ok(())
    }
}
