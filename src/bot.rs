//! Command dispatch — the thin layer between channel messages and the
//! agenda core. Every handler replies in the channel the command came from;
//! errors become human-readable text and never mutate state.

use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use tokio::sync::Mutex;

use flagwatch_agenda::{Event, EventStore};
use flagwatch_catalog::CatalogClient;
use flagwatch_channels::DiscordChannel;
use flagwatch_core::error::{FlagwatchError, Result};
use flagwatch_core::types::{IncomingMessage, Notice};

use crate::commands::Command;
use crate::render;

/// How long the `/clear` prompt waits for a reaction before cancelling.
const CLEAR_CONFIRM_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

pub struct Bot {
    channel: Arc<DiscordChannel>,
    store: Arc<Mutex<EventStore>>,
    catalog: CatalogClient,
    display_offset: FixedOffset,
}

impl Bot {
    pub fn new(
        channel: Arc<DiscordChannel>,
        store: Arc<Mutex<EventStore>>,
        catalog: CatalogClient,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            channel,
            store,
            catalog,
            display_offset,
        }
    }

    /// Announce ourselves in the audience channel.
    pub async fn greet(&self) {
        let text = "Hello, I am Flagwatch 🤖\nTo see the list of commands, type `/help`.";
        self.say(self.channel.audience_channel(), text).await;
    }

    /// Handle one incoming channel message.
    pub async fn handle(&self, message: IncomingMessage) {
        let Some(command) = Command::parse(&message.content) else {
            return;
        };
        tracing::debug!("💬 {:?} from {}", command, message.sender_id);
        let channel_id = message.channel_id.clone();

        match command {
            Command::Add { url } => self.cmd_add(&channel_id, &url).await,
            Command::Agenda => self.cmd_agenda(&channel_id).await,
            Command::Details { name } => self.cmd_details(&channel_id, &name).await,
            Command::Remove { name } => self.cmd_remove(&channel_id, &name).await,
            Command::Clear => self.cmd_clear(&channel_id, &message.sender_id).await,
            Command::Upcoming => self.cmd_upcoming(&channel_id).await,
            Command::Help => self.show(&channel_id, &render::help_notice()).await,
            Command::Unknown(_) => {
                self.say(
                    &channel_id,
                    "Command not found. Type `/help` for a list of available commands.",
                )
                .await;
            }
            Command::Invalid { usage } => {
                self.say(&channel_id, &format!("Usage: `{usage}`")).await;
            }
        }
    }

    async fn cmd_add(&self, channel_id: &str, url: &str) {
        match self.add_event(url).await {
            Ok(name) => self.say(channel_id, &format!("Event `{name}` added.")).await,
            Err(e) => self.say(channel_id, &error_reply(&e)).await,
        }
    }

    /// Fetch → validate → store. Transactional: any failure leaves the
    /// store untouched.
    async fn add_event(&self, url: &str) -> Result<String> {
        let raw = self.catalog.fetch_event(url).await?;
        let event = Event::from_catalog(&raw, Utc::now())?;
        self.store.lock().await.add(event)
    }

    async fn cmd_agenda(&self, channel_id: &str) {
        let notice = {
            let store = self.store.lock().await;
            if store.is_empty() {
                None
            } else {
                Some(render::agenda_notice(store.list(), self.display_offset))
            }
        };
        match notice {
            Some(notice) => self.show(channel_id, &notice).await,
            None => self.say(channel_id, "No events added yet.").await,
        }
    }

    async fn cmd_details(&self, channel_id: &str, name: &str) {
        let notice = {
            let store = self.store.lock().await;
            store
                .get(name)
                .map(|event| render::details_notice(event, self.display_offset))
        };
        match notice {
            Some(notice) => self.show(channel_id, &notice).await,
            None => {
                self.say(channel_id, &format!("Event `{name}` not found."))
                    .await;
            }
        }
    }

    async fn cmd_remove(&self, channel_id: &str, name: &str) {
        let result = self.store.lock().await.remove(name);
        match result {
            Ok(()) => self.say(channel_id, &format!("Event `{name}` removed.")).await,
            Err(e) => self.say(channel_id, &error_reply(&e)).await,
        }
    }

    /// `/clear` — destructive, so it asks first. Only the requesting user's
    /// reaction counts; no reaction within the timeout means cancel.
    async fn cmd_clear(&self, channel_id: &str, sender_id: &str) {
        let prompt = match self
            .channel
            .send_notice(channel_id, &render::clear_warning_notice())
            .await
        {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("⚠️ Failed to send clear prompt: {e}");
                return;
            }
        };
        for emoji in ["✅", "❌"] {
            if let Err(e) = self.channel.add_reaction(channel_id, &prompt.id, emoji).await {
                tracing::warn!("⚠️ Failed to react to clear prompt: {e}");
            }
        }

        let choice = self
            .channel
            .await_reaction(
                channel_id,
                &prompt.id,
                sender_id,
                &["✅", "❌"],
                CLEAR_CONFIRM_TIMEOUT,
            )
            .await;

        match choice {
            Ok(Some(emoji)) if emoji == "✅" => {
                let result = self.store.lock().await.clear();
                match result {
                    Ok(()) => self.say(channel_id, "All events cleared.").await,
                    Err(e) => self.say(channel_id, &error_reply(&e)).await,
                }
            }
            Ok(Some(_)) => self.say(channel_id, "Clearing events cancelled.").await,
            // Timeout or reaction-poll failure: default to cancel, quietly.
            Ok(None) => {}
            Err(e) => tracing::warn!("⚠️ Clear confirmation failed: {e}"),
        }

        if let Err(e) = self.channel.delete_message(channel_id, &prompt.id).await {
            tracing::debug!("Could not delete clear prompt: {e}");
        }
    }

    async fn cmd_upcoming(&self, channel_id: &str) {
        match self.catalog.upcoming().await {
            Ok(events) => {
                self.show(channel_id, &render::upcoming_notice(&events, self.display_offset))
                    .await;
            }
            Err(e) => self.say(channel_id, &error_reply(&e)).await,
        }
    }

    async fn say(&self, channel_id: &str, text: &str) {
        if let Err(e) = self.channel.send_text(channel_id, text).await {
            tracing::warn!("⚠️ Failed to send reply: {e}");
        }
    }

    async fn show(&self, channel_id: &str, notice: &Notice) {
        if let Err(e) = self.channel.send_notice(channel_id, notice).await {
            tracing::warn!("⚠️ Failed to send embed: {e}");
        }
    }
}

/// Turn an error into the reply the channel sees.
fn error_reply(error: &FlagwatchError) -> String {
    match error {
        FlagwatchError::DuplicateName(name) => format!("Event `{name}` already exists."),
        FlagwatchError::NotFound(name) => format!("Event `{name}` not found."),
        FlagwatchError::AlreadyFinished => "Error: Event has already finished.".into(),
        other => format!("Error: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_replies_match_the_bot_voice() {
        assert_eq!(
            error_reply(&FlagwatchError::DuplicateName("X_CTF".into())),
            "Event `X_CTF` already exists."
        );
        assert_eq!(
            error_reply(&FlagwatchError::NotFound("X_CTF".into())),
            "Event `X_CTF` not found."
        );
        assert_eq!(
            error_reply(&FlagwatchError::AlreadyFinished),
            "Error: Event has already finished."
        );
        assert_eq!(
            error_reply(&FlagwatchError::CatalogUnreachable("404 Not Found".into())),
            "Error: catalog unreachable: 404 Not Found"
        );
    }
}
