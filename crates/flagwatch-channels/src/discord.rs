//! Discord channel — REST polling + embed sending via the Bot API.
//! No gateway connection: the bot reads its single channel by polling
//! `GET /channels/{id}/messages` and reacts/replies over plain HTTP.

use async_trait::async_trait;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};

use flagwatch_core::config::DiscordConfig;
use flagwatch_core::error::{FlagwatchError, Result};
use flagwatch_core::traits::NotificationSink;
use flagwatch_core::types::{IncomingMessage, Notice};

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord channel client. Cheap to clone — the polling loop takes its own
/// copy and the rest of the bot shares one behind an Arc.
#[derive(Clone)]
pub struct DiscordChannel {
    config: DiscordConfig,
    client: reqwest::Client,
    api_base: String,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bot {}", config.bot_token);
        let mut auth_value = reqwest::header::HeaderValue::from_str(&auth)
            .map_err(|_| FlagwatchError::Channel("Invalid bot token".into()))?;
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FlagwatchError::Channel(format!("Client build failed: {e}")))?;

        Ok(Self {
            config,
            client,
            api_base: API_BASE.to_string(),
        })
    }

    /// Override the API base URL (tests point this at a mock server).
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    /// The configured audience channel id.
    pub fn audience_channel(&self) -> &str {
        &self.config.channel_id
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Verify the token and log who we are.
    pub async fn connect(&self) -> Result<DiscordUser> {
        let me = self.get_me().await?;
        tracing::info!(
            "🤖 Discord bot: {} ({})",
            me.username.as_deref().unwrap_or("unknown"),
            me.id
        );
        Ok(me)
    }

    /// Get the authenticated bot user.
    pub async fn get_me(&self) -> Result<DiscordUser> {
        let response = self
            .client
            .get(self.api_url("/users/@me"))
            .send()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("getMe failed: {e}")))?;
        Self::check_status(&response)?;
        response
            .json::<DiscordUser>()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("Invalid getMe response: {e}")))
    }

    /// Send a plain text message. Returns the created message.
    pub async fn send_text(&self, channel_id: &str, text: &str) -> Result<DiscordMessage> {
        self.create_message(channel_id, serde_json::json!({ "content": text }))
            .await
    }

    /// Send a notice as an embed. Returns the created message.
    pub async fn send_notice(&self, channel_id: &str, notice: &Notice) -> Result<DiscordMessage> {
        self.create_message(
            channel_id,
            serde_json::json!({ "embeds": [embed_json(notice)] }),
        )
        .await
    }

    async fn create_message(
        &self,
        channel_id: &str,
        body: serde_json::Value,
    ) -> Result<DiscordMessage> {
        let url = self.api_url(&format!("/channels/{channel_id}/messages"));
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("sendMessage failed: {e}")))?;
        Self::check_status(&response)?;
        response
            .json::<DiscordMessage>()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("Invalid send response: {e}")))
    }

    /// Delete a message (used to clean up the clear-confirmation prompt).
    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let url = self.api_url(&format!("/channels/{channel_id}/messages/{message_id}"));
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("deleteMessage failed: {e}")))?;
        Self::check_status(&response)
    }

    /// React to a message as the bot.
    pub async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<()> {
        let url = self.api_url(&format!(
            "/channels/{channel_id}/messages/{message_id}/reactions/{}/@me",
            urlencoding::encode(emoji)
        ));
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("addReaction failed: {e}")))?;
        Self::check_status(&response)
    }

    /// Users who reacted with the given emoji.
    pub async fn reaction_users(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<Vec<DiscordUser>> {
        let url = self.api_url(&format!(
            "/channels/{channel_id}/messages/{message_id}/reactions/{}",
            urlencoding::encode(emoji)
        ));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("getReactions failed: {e}")))?;
        Self::check_status(&response)?;
        response
            .json::<Vec<DiscordUser>>()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("Invalid reactions response: {e}")))
    }

    /// Wait until `user_id` reacts to `message_id` with one of `emojis`.
    /// Polls at the configured interval; `Ok(None)` on timeout — callers
    /// treat that as cancel.
    pub async fn await_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        user_id: &str,
        emojis: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Option<String>> {
        let deadline = tokio::time::Instant::now() + timeout;
        let poll = std::time::Duration::from_secs(self.config.poll_interval_secs.max(1));
        loop {
            for emoji in emojis {
                let users = self.reaction_users(channel_id, message_id, emoji).await?;
                if users.iter().any(|u| u.id == user_id) {
                    return Ok(Some((*emoji).to_string()));
                }
            }
            if tokio::time::Instant::now() + poll >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Messages in a channel strictly after the given id, oldest first.
    /// Without an anchor, returns just the newest message (used to seed the
    /// polling cursor so old history is never replayed as commands).
    pub async fn fetch_messages_after(
        &self,
        channel_id: &str,
        after: Option<&str>,
    ) -> Result<Vec<DiscordMessage>> {
        let url = self.api_url(&format!("/channels/{channel_id}/messages"));
        let mut request = self.client.get(&url);
        request = match after {
            Some(anchor) => request.query(&[("after", anchor), ("limit", "50")]),
            None => request.query(&[("limit", "1")]),
        };
        let response = request
            .send()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("getMessages failed: {e}")))?;
        Self::check_status(&response)?;
        let mut messages = response
            .json::<Vec<DiscordMessage>>()
            .await
            .map_err(|e| FlagwatchError::Channel(format!("Invalid messages response: {e}")))?;
        // Discord returns newest first.
        messages.reverse();
        Ok(messages)
    }

    /// Start the polling loop — returns a stream of IncomingMessages from
    /// the audience channel. Bot-authored messages are filtered out.
    pub fn start_polling(self) -> DiscordPollingStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let channel_id = self.config.channel_id.clone();
            let poll = std::time::Duration::from_secs(self.config.poll_interval_secs.max(1));
            tracing::info!("📡 Discord polling loop started");

            // Seed the cursor at the newest message so history stays quiet.
            let mut cursor: Option<String> = loop {
                match self.fetch_messages_after(&channel_id, None).await {
                    Ok(messages) => break messages.last().map(|m| m.id.clone()),
                    Err(e) => {
                        tracing::error!("Discord cursor seed error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            };

            loop {
                match self.fetch_messages_after(&channel_id, cursor.as_deref()).await {
                    Ok(messages) => {
                        if let Some(last) = messages.last() {
                            cursor = Some(last.id.clone());
                        }
                        for message in messages {
                            if let Some(incoming) = message.to_incoming()
                                && tx.send(incoming).is_err()
                            {
                                tracing::info!("Discord polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Discord polling error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }

                tokio::time::sleep(poll).await;
            }
        });

        DiscordPollingStream { rx }
    }

    fn check_status(response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(FlagwatchError::Channel(format!(
                "Discord API error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )))
        }
    }
}

/// Stream of incoming channel messages from polling.
pub struct DiscordPollingStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<IncomingMessage>,
}

impl Stream for DiscordPollingStream {
    type Item = IncomingMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for DiscordPollingStream {}

#[async_trait]
impl NotificationSink for DiscordChannel {
    async fn notify(&self, target: &str, notice: &Notice) -> Result<()> {
        self.send_notice(target, notice)
            .await
            .map(|_| ())
            .map_err(|e| FlagwatchError::Notify(e.to_string()))
    }
}

/// Translate a [`Notice`] into a Discord embed object.
pub fn embed_json(notice: &Notice) -> serde_json::Value {
    let fields: Vec<serde_json::Value> = notice
        .fields
        .iter()
        .map(|f| {
            serde_json::json!({
                "name": f.name,
                "value": f.value,
                "inline": f.inline,
            })
        })
        .collect();
    serde_json::json!({
        "title": notice.title,
        "description": notice.body,
        "color": notice.color,
        "fields": fields,
    })
}

// --- Discord API Types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordMessage {
    pub id: String,
    pub channel_id: String,
    pub author: DiscordUser,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl DiscordMessage {
    /// Convert to a Flagwatch IncomingMessage. Bot messages are dropped.
    pub fn to_incoming(&self) -> Option<IncomingMessage> {
        if self.author.bot || self.content.is_empty() {
            return None;
        }
        Some(IncomingMessage {
            channel_id: self.channel_id.clone(),
            message_id: self.id.clone(),
            sender_id: self.author.id.clone(),
            sender_name: self.author.username.clone(),
            content: self.content.clone(),
            timestamp: chrono::Utc::now(),
        })
    }
}
