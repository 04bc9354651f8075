//! Discord REST client used for replies and lookups.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use tracing::{debug, warn};

use super::dto::{
    AllowedMentions, AttachmentSlot, CreateMessageRequest, ErrorResponse, MessageReferenceRequest,
};
use super::gateway::{ChannelPayload, EventParser, MessagePayload};
use crate::domain::entities::{BotToken, ChannelId, Message, MessageId};
use crate::domain::errors::DiscordError;
use crate::domain::ports::{MessagingPort, OutgoingFile};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = concat!("DiscordBot (frametrim, ", env!("CARGO_PKG_VERSION"), ")");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_AFTER_MS: u64 = 5000;
const MAX_RATE_LIMIT_WAIT_MS: u64 = 10_000;

/// Discord REST API client authenticated as a bot.
pub struct DiscordClient {
    client: Client,
    base_url: String,
    authorization: String,
}

impl DiscordClient {
    /// Creates new client with default base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(token: &BotToken) -> Result<Self, DiscordError> {
        Self::with_base_url(token, DISCORD_API_BASE)
    }

    /// Creates client with custom base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_base_url(
        token: &BotToken,
        base_url: impl Into<String>,
    ) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DiscordError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authorization: token.authorization_header(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a request, waiting out one short rate limit before giving up.
    async fn execute<F>(&self, resource: &str, build: F) -> Result<Response, DiscordError>
    where
        F: Fn() -> Result<RequestBuilder, DiscordError> + Send + Sync,
    {
        let mut retried = false;

        loop {
            let response = build()?
                .header(header::AUTHORIZATION, &self.authorization)
                .send()
                .await
                .map_err(|e| {
                    warn!(resource, error = %e, "Discord request failed");
                    transport_error(&e)
                })?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let error = Self::handle_error_response(status, response, resource).await;
            match error {
                DiscordError::RateLimited { retry_after_ms }
                    if !retried && retry_after_ms <= MAX_RATE_LIMIT_WAIT_MS =>
                {
                    warn!(resource, retry_after_ms, "Rate limited, retrying once");
                    tokio::time::sleep(Duration::from_millis(retry_after_ms)).await;
                    retried = true;
                }
                other => return Err(other),
            }
        }
    }

    async fn handle_error_response(
        status: StatusCode,
        response: Response,
        resource: &str,
    ) -> DiscordError {
        let body = response.json::<ErrorResponse>().await.ok();
        let error_message = body
            .as_ref()
            .map_or_else(|| format!("HTTP {status}"), |b| b.message.clone());

        match status {
            StatusCode::UNAUTHORIZED => DiscordError::rejected("invalid bot token"),
            StatusCode::FORBIDDEN => {
                DiscordError::rejected(format!("missing access: {error_message}"))
            }
            StatusCode::NOT_FOUND => DiscordError::not_found(resource),
            StatusCode::TOO_MANY_REQUESTS => DiscordError::RateLimited {
                retry_after_ms: body
                    .and_then(|b| b.retry_after)
                    .map_or(DEFAULT_RETRY_AFTER_MS, seconds_to_millis),
            },
            s if s.is_server_error() => {
                DiscordError::network(format!("Discord API unavailable: {status}"))
            }
            _ => DiscordError::unexpected(format!(
                "unexpected response: {status} - {error_message}"
            )),
        }
    }

    fn reply_form(payload_json: &str, files: &[OutgoingFile]) -> Result<Form, DiscordError> {
        let mut form = Form::new().text("payload_json", payload_json.to_string());

        for (index, file) in files.iter().enumerate() {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| DiscordError::unexpected(format!("invalid MIME type: {e}")))?;
            form = form.part(format!("files[{index}]"), part);
        }

        Ok(form)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds_to_millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).ceil() as u64
}

fn transport_error(e: &reqwest::Error) -> DiscordError {
    if e.is_timeout() {
        DiscordError::network("request timed out")
    } else if e.is_connect() {
        DiscordError::network("failed to connect to Discord")
    } else {
        DiscordError::network(e.to_string())
    }
}

#[async_trait]
impl MessagingPort for DiscordClient {
    async fn reply(
        &self,
        message: &Message,
        content: &str,
        files: Vec<OutgoingFile>,
    ) -> Result<(), DiscordError> {
        let url = self.url(&format!("/channels/{}/messages", message.channel_id()));

        let request = CreateMessageRequest {
            content,
            message_reference: Some(MessageReferenceRequest {
                message_id: message.id().to_string(),
                channel_id: message.channel_id().to_string(),
                fail_if_not_exists: false,
            }),
            allowed_mentions: AllowedMentions::default(),
            attachments: files
                .iter()
                .enumerate()
                .map(|(id, file)| AttachmentSlot {
                    id,
                    filename: &file.name,
                })
                .collect(),
        };

        let payload_json = serde_json::to_string(&request)
            .map_err(|e| DiscordError::unexpected(format!("failed to encode reply: {e}")))?;

        debug!(
            message_id = %message.id(),
            files = files.len(),
            "Sending reply"
        );

        self.execute("message", || {
            let builder = self.client.post(&url);
            if files.is_empty() {
                Ok(builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(payload_json.clone()))
            } else {
                Ok(builder.multipart(Self::reply_form(&payload_json, &files)?))
            }
        })
        .await?;

        Ok(())
    }

    async fn send_channel_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<(), DiscordError> {
        let url = self.url(&format!("/channels/{channel_id}/messages"));
        let request = CreateMessageRequest {
            content,
            message_reference: None,
            allowed_mentions: AllowedMentions::default(),
            attachments: Vec::new(),
        };

        self.execute("channel", || Ok(self.client.post(&url).json(&request)))
            .await?;

        Ok(())
    }

    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<Message, DiscordError> {
        let url = self.url(&format!("/channels/{channel_id}/messages/{message_id}"));

        let response = self
            .execute("message", || Ok(self.client.get(&url)))
            .await?;

        let payload: MessagePayload = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse message response");
            DiscordError::unexpected(format!("failed to parse message: {e}"))
        })?;

        let message = EventParser::convert_message_payload(payload)
            .map_err(|e| DiscordError::unexpected(e.to_string()))?;

        Ok(message.with_partial(false))
    }

    async fn fetch_channel_parent(
        &self,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelId>, DiscordError> {
        let url = self.url(&format!("/channels/{channel_id}"));

        let response = self
            .execute("channel", || Ok(self.client.get(&url)))
            .await?;

        let payload: ChannelPayload = response.json().await.map_err(|e| {
            DiscordError::unexpected(format!("failed to parse channel: {e}"))
        })?;

        Ok(EventParser::convert_channel(payload).and_then(|link| link.parent_id))
    }
}
