//! Shared state for the bot, accessible across all handlers.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use vimrc_core::{fix_vimrc, parse_reference, resolve, BotConfig, Progressor, RemoteSource};
use vimrc_models::{ArchiveVimrc, ChatMessage, NextVimrc, VimrcFile};
use vimrc_repos::archive::parse_next;
use vimrc_repos::{github_url_info, ContentStore, NextRequest, RepoError};

use crate::command::ChatCommand;
use crate::error::{BotError, Result};
use crate::messages;

/// Archive record of the scheduled session `next`.
///
/// Members, log and pinned files are taken from `progressor` only when it
/// ran that very session.
pub fn session_result(next: NextVimrc, progressor: &Progressor) -> ArchiveVimrc {
    let mut result = ArchiveVimrc::from(next);
    if result.id == progressor.id() {
        result.members = progressor.members();
        result.log = Some(progressor.log_url().to_string()).filter(|url| !url.is_empty());
        result.vimrcs = progressor.vimrcs().to_vec();
    }
    result
}

/// Everything the handlers share.
///
/// Each session transition happens under a single write guard of the
/// progressor.
pub struct BotState {
    config: BotConfig,
    source: Arc<dyn RemoteSource>,
    progressor: RwLock<Progressor>,
    /// Installed once the working copies are ready.
    store: RwLock<Option<Arc<ContentStore>>>,
    http: reqwest::Client,
}

impl BotState {
    pub fn new(config: BotConfig, source: Arc<dyn RemoteSource>) -> Self {
        Self {
            config,
            source,
            progressor: RwLock::new(Progressor::new()),
            store: RwLock::new(None),
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn source(&self) -> Arc<dyn RemoteSource> {
        Arc::clone(&self.source)
    }

    /// Whether messages from `chat_id` are handled.
    pub fn accepts_chat(&self, chat_id: i64) -> bool {
        self.config.chat_id.map_or(true, |id| id == chat_id)
    }

    pub async fn install_store(&self, store: ContentStore) {
        info!(repository = %store.repository(), "content store installed");
        *self.store.write().await = Some(Arc::new(store));
    }

    async fn installed_store(&self) -> Option<Arc<ContentStore>> {
        self.store.read().await.clone()
    }

    async fn store(&self) -> Result<Arc<ContentStore>> {
        self.installed_store()
            .await
            .ok_or(BotError::Repos(RepoError::SetupNotCalled))
    }

    /// Count a plain chat message toward the running session.
    pub async fn record_message(&self, message: ChatMessage) {
        self.progressor.write().await.add_message(message);
    }

    /// Reply to a line reference, if `text` is one and a session is running.
    pub async fn quote(&self, text: &str, user: &str) -> Option<String> {
        let request = parse_reference(text)?;
        let mut progressor = self.progressor.write().await;
        if !progressor.is_running() {
            return None;
        }
        match resolve(&mut progressor, &request, user) {
            Some(file) => Some(messages::quote(&file)),
            None => request.file.as_deref().map(messages::file_not_found),
        }
    }

    /// Run `command` for `user`, returning the replies in order.
    pub async fn execute(&self, command: ChatCommand, user: &str, log_url: &str) -> Result<Vec<String>> {
        if command.requires_admin() && !self.config.is_admin(user) {
            warn!(user, command = ?command, "admin command from non-admin user");
            return Ok(Vec::new());
        }
        debug!(user, command = ?command, "executing command");

        let reply = match command {
            ChatCommand::Start => return self.start_session(log_url).await,
            ChatCommand::Stop => return Ok(self.stop_session().await),
            ChatCommand::Reset => {
                self.progressor.write().await.reset();
                "reset".to_string()
            }
            ChatCommand::Restore => {
                self.progressor.write().await.restore();
                "restored".to_string()
            }
            ChatCommand::Status => self.progressor.read().await.status().to_string(),
            ChatCommand::Members => {
                let progressor = self.progressor.read().await;
                messages::members(&progressor.members(), progressor.log_url())
            }
            ChatCommand::MembersWithCount => {
                let progressor = self.progressor.read().await;
                messages::members_with_count(&progressor.members_with_count(), progressor.log_url())
            }
            ChatCommand::Next(tokens) => self.update_next(&tokens).await?,
            ChatCommand::Request { force, url, comment } => {
                self.request(user, force, &url, comment.as_deref()).await?
            }
            ChatCommand::Help => messages::help(),
            ChatCommand::Unknown(name) => {
                debug!(name = %name, "unknown command");
                return Ok(Vec::new());
            }
        };
        Ok(vec![reply])
    }

    /// The scheduled session: from the site working copy when available,
    /// else from the published file.
    async fn read_schedule(&self) -> Result<NextVimrc> {
        if let Some(store) = self.installed_store().await {
            return Ok(store.read_next_yaml().await?);
        }
        let url = self.config.next_yaml_url();
        parse_next(&self.source.fetch_text(&url).await?)?.ok_or(BotError::NoSchedule(url))
    }

    /// Pin the scheduled files, load them and start the session.
    async fn start_session(&self, log_url: &str) -> Result<Vec<String>> {
        let next = self.read_schedule().await?;

        let source = self.source.as_ref();
        let vimrcs: Vec<VimrcFile> =
            try_join_all(next.vimrcs.iter().map(|vimrc| fix_vimrc(source, vimrc))).await?;

        let loaded = join_all(vimrcs.iter().map(|vimrc| async move {
            let raw_url = vimrc.raw_url.as_deref().unwrap_or(&vimrc.url);
            let text = source.fetch_text(raw_url).await;
            if let Err(e) = &text {
                error!(url = %raw_url, error = %e, "failed to load session file");
            }
            (vimrc, text)
        }))
        .await;

        let mut failures = Vec::new();
        {
            let mut progressor = self.progressor.write().await;
            progressor.start(next.id, log_url, vimrcs.clone(), next.part);
            for (vimrc, text) in loaded {
                match text {
                    Ok(text) => progressor.set_vimrc_content(vimrc.url.clone(), &text),
                    Err(_) => failures.push(messages::load_failed(&vimrc.name)),
                }
            }
        }
        info!(id = next.id, author = %next.author.name, files = vimrcs.len(), "session started");

        self.notify_activity(&messages::activity_summary(&next, &vimrcs))
            .await;

        let mut replies = vec![messages::starting_message(&next, &vimrcs)];
        replies.extend(failures);
        Ok(replies)
    }

    /// Stop the session and archive it when the repositories are available.
    /// Archive failures are reported after the closing words.
    async fn stop_session(&self) -> Vec<String> {
        let (was_running, part) = {
            let mut progressor = self.progressor.write().await;
            let was_running = progressor.is_running();
            progressor.stop();
            (was_running, progressor.part())
        };
        let mut replies = vec![messages::stopped(part, &self.config.request_page)];
        if !was_running {
            return replies;
        }

        let Some(store) = self.installed_store().await else {
            return replies;
        };
        match self.archive(&store).await {
            Ok(id) => replies.push(messages::archived(id, &self.config.archive_url(id))),
            Err(e) => {
                error!(error = %e, "failed to archive the session");
                replies.push(messages::error(&e));
            }
        }
        replies
    }

    async fn archive(&self, store: &ContentStore) -> Result<u32> {
        let next = store.read_next_yaml().await?;
        let result = session_result(next, &*self.progressor.read().await);
        store.finish(&result).await?;
        info!(id = result.id, members = result.members.len(), "session archived");
        Ok(result.id)
    }

    async fn update_next(&self, tokens: &[String]) -> Result<String> {
        NextRequest::parse(tokens)?;
        let store = self.store().await?;

        let scheduled = store.read_next_yaml().await?;
        let result = session_result(scheduled, &*self.progressor.read().await);
        let next = store.next(tokens, &result).await?;
        Ok(messages::next_updated(&next))
    }

    async fn request(&self, requester: &str, force: bool, url: &str, comment: Option<&str>) -> Result<String> {
        if !url.starts_with("https://github.com/") {
            return Ok(messages::not_github_url(url));
        }
        let store = self.store().await?;
        let author = github_url_info(url).author.name;

        if !force && store.read_target_members().await?.contains(&author) {
            return Ok(messages::already_read(&author));
        }
        if store.add_wiki_entry(requester, &author, url, comment).await? {
            Ok(messages::requested(&self.config.request_page))
        } else {
            Ok(messages::not_requested(&self.config.request_page))
        }
    }

    /// Post `message` to the activity webhook, if configured. Failures are logged.
    async fn notify_activity(&self, message: &str) {
        let Some(hook) = &self.config.activity_hook_url else {
            return;
        };
        let body = serde_json::json!({ "message": message });
        match self.http.post(hook).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(status = %response.status(), "activity posted");
            }
            Ok(response) => {
                warn!(status = %response.status(), "activity webhook rejected the post");
            }
            Err(e) => {
                error!(error = %e, "failed to post activity");
            }
        }
    }
}

/// Create shared state for the handlers.
pub fn create_shared_state(config: BotConfig, source: Arc<dyn RemoteSource>) -> Arc<BotState> {
    Arc::new(BotState::new(config, source))
}
