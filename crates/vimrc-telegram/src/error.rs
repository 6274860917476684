//! Error types for the Telegram bot.

use thiserror::Error;
use vimrc_core::CoreError;
use vimrc_repos::RepoError;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Bot token not provided or invalid.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// The published schedule holds no session.
    #[error("no session in {0}")]
    NoSchedule(String),

    #[error(transparent)]
    Repos(#[from] RepoError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
