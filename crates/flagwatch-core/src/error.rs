//! Error taxonomy — every failure the bot can surface, in one enum.
//! Command handlers turn these into human-readable replies; the scheduler
//! only ever logs them and keeps running.

use thiserror::Error;

/// All Flagwatch errors.
#[derive(Debug, Error)]
pub enum FlagwatchError {
    /// An event with the same sanitized name is already tracked.
    #[error("event `{0}` already exists")]
    DuplicateName(String),

    /// No tracked event under that name.
    #[error("event `{0}` not found")]
    NotFound(String),

    /// The catalog says the competition is already over — never stored.
    #[error("event has already finished")]
    AlreadyFinished,

    /// Could not reach the event catalog (transport or HTTP status error).
    #[error("catalog unreachable: {0}")]
    CatalogUnreachable(String),

    /// The catalog answered with something we could not decode.
    #[error("malformed catalog response: {0}")]
    CatalogMalformed(String),

    /// Saving or loading the event store failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Dispatching a notification failed; the milestone is retried next tick.
    #[error("notification failure: {0}")]
    Notify(String),

    /// Chat channel transport error (connect, poll, reactions).
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FlagwatchError>;
