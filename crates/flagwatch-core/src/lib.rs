//! # Flagwatch Core
//!
//! Shared foundation for the Flagwatch bot: configuration, error taxonomy,
//! message types, and the notification sink trait implemented by channels.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::FlagwatchConfig;
pub use error::{FlagwatchError, Result};
pub use traits::NotificationSink;
pub use types::{IncomingMessage, Notice, NoticeField};
