//! Shared message types exchanged between the channel layer and the bot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A command message read from the audience channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Platform message id (needed for reaction lookups).
    pub message_id: String,
    /// Author id.
    pub sender_id: String,
    /// Author display name, if the platform provides one.
    pub sender_name: Option<String>,
    /// Raw text content.
    pub content: String,
    /// When we received it.
    pub timestamp: DateTime<Utc>,
}

/// A rendered notification: title + body + accent color + key/value fields.
/// Channels translate this into their native rich-message format
/// (Discord embeds here); the core never speaks wire formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
    /// Accent color, 0xRRGGBB.
    pub color: u32,
    #[serde(default)]
    pub fields: Vec<NoticeField>,
}

/// One labelled value inside a [`Notice`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            color,
            fields: Vec::new(),
        }
    }

    /// Append a field (builder style).
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(NoticeField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// Accent colors used across the bot (the classic palette).
pub mod colors {
    pub const BLURPLE: u32 = 0x7289DA;
    pub const RED: u32 = 0xFF0000;
    pub const GREEN: u32 = 0x00FF00;
    pub const ORANGE: u32 = 0xFFA500;
    pub const CYAN: u32 = 0x00FFFF;
}
