//! Bot wiring: teloxide dispatcher plus background repository setup.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info, warn};
use vimrc_core::{BotConfig, GithubClient};
use vimrc_repos::ContentStore;

use crate::error::{BotError, Result};
use crate::handlers::handle_message;
use crate::state::{create_shared_state, BotState};

/// The reading vimrc bot.
pub struct ReadingVimrcBot {
    bot: Bot,
    state: Arc<BotState>,
}

impl ReadingVimrcBot {
    /// Create the bot from `config`.
    ///
    /// Requires `TELEGRAM_BOT_TOKEN` environment variable to be set.
    pub fn new(config: BotConfig) -> Result<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or(BotError::NoToken)?;

        let state = create_shared_state(config, Arc::new(GithubClient::new()));
        Ok(Self::with_state(Bot::new(token), state))
    }

    /// Create the bot around existing state.
    pub fn with_state(bot: Bot, state: Arc<BotState>) -> Self {
        Self { bot, state }
    }

    pub fn state(&self) -> Arc<BotState> {
        Arc::clone(&self.state)
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| BotError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Prepare the repositories in the background and install the store
    /// once the working copies are ready.
    fn spawn_store_setup(&self) {
        let state = Arc::clone(&self.state);
        let Some(mut store) = ContentStore::from_config(state.config(), state.source()) else {
            warn!("READING_VIMRC_GITHUB_REPOS or READING_VIMRC_GITHUB_API_TOKEN not set; archives and requests are disabled");
            return;
        };
        tokio::spawn(async move {
            info!(repository = %store.repository(), "preparing repositories");
            match store.setup().await {
                Ok(()) => state.install_store(store).await,
                Err(e) => error!(error = %e, "repository setup failed"),
            }
        });
    }

    /// Run the bot in polling mode until Ctrl+C.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");
        self.spawn_store_setup();

        let state = Arc::clone(&self.state);
        let handler = Update::filter_message()
            .filter(|msg: Message| msg.text().is_some())
            .endpoint(move |bot: Bot, msg: Message| {
                let state = Arc::clone(&state);
                async move { handle_message(bot, msg, state).await }
            });

        Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|upd| async move {
                tracing::trace!("Unhandled update: {:?}", upd);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("bot stopped");
        Ok(())
    }
}
