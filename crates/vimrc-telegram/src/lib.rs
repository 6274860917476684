//! Telegram bot for the reading vimrc sessions.
//!
//! The bot counts who speaks during a session, quotes lines of the files
//! being read and keeps the site and wiki repositories up to date.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//!
//! Optional:
//! - `READING_VIMRC_CHAT_ID`: Only listen in this chat
//! - `READING_VIMRC_ADMIN_USERS`: Comma separated users allowed to run admin commands
//! - `READING_VIMRC_GITHUB_REPOS`: `owner/repo` of the site; enables archives and requests
//! - `READING_VIMRC_GITHUB_API_TOKEN`: Token used to register the deploy key
//! - `READING_VIMRC_ACTIVITY_HOOK_URL`: Webhook notified when a session starts
//!
//! # Example
//!
//! ```no_run
//! use vimrc_core::BotConfig;
//! use vimrc_telegram::ReadingVimrcBot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bot = ReadingVimrcBot::new(BotConfig::from_env()?)?;
//!     bot.start_polling().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! Every command is a message starting with `!reading_vimrc`; see
//! [`messages::help`] for the list.

pub mod bot;
pub mod command;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod state;

pub use bot::ReadingVimrcBot;
pub use command::ChatCommand;
pub use error::{BotError, Result};
pub use state::{create_shared_state, BotState};
