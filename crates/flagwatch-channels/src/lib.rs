//! # Flagwatch Channels
//!
//! Chat-platform plumbing. One implementation today: Discord over the REST
//! API (message polling + embed sending + reaction confirm/cancel).

pub mod discord;

pub use discord::{DiscordChannel, DiscordPollingStream};
