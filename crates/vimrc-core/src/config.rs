//! Shared configuration for the reading vimrc bot.
//!
//! Provides functions to locate the bot's state directory and reads the
//! environment-driven settings.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.reading-vimrc/
//! ├── config/       # .env.local with secrets
//! └── work/         # Git working copies and the deploy key
//!     ├── .ssh/
//!     ├── gh-pages/
//!     └── wiki/
//! ```
//!
//! # Environment Variables
//!
//! - `READING_VIMRC_STATE_DIR`: Override the base state directory
//! - `READING_VIMRC_WORK_DIR`: Override the working directory
//! - the `READING_VIMRC_*` settings read by [`BotConfig::from_env`]

use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::FixedOffset;

use crate::error::{CoreError, Result};

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "READING_VIMRC_STATE_DIR";

/// Environment variable for custom working directory.
pub const WORK_DIR_ENV: &str = "READING_VIMRC_WORK_DIR";

pub const CHAT_ID_ENV: &str = "READING_VIMRC_CHAT_ID";
pub const ADMIN_USERS_ENV: &str = "READING_VIMRC_ADMIN_USERS";
pub const HOMEPAGE_ENV: &str = "READING_VIMRC_HOMEPAGE";
pub const REQUEST_PAGE_ENV: &str = "READING_VIMRC_REQUEST_PAGE";
pub const GITHUB_REPOS_ENV: &str = "READING_VIMRC_GITHUB_REPOS";
pub const GITHUB_API_TOKEN_ENV: &str = "READING_VIMRC_GITHUB_API_TOKEN";
pub const GIT_USER_NAME_ENV: &str = "READING_VIMRC_GIT_USER_NAME";
pub const GIT_USER_EMAIL_ENV: &str = "READING_VIMRC_GIT_USER_EMAIL";
pub const ACTIVITY_HOOK_URL_ENV: &str = "READING_VIMRC_ACTIVITY_HOOK_URL";
pub const TIMEZONE_OFFSET_ENV: &str = "READING_VIMRC_TIMEZONE_OFFSET";

/// Default site URL. Must end with `/`.
pub const DEFAULT_HOMEPAGE: &str = "https://vim-jp.org/reading-vimrc/";

/// Default request page on the wiki.
pub const DEFAULT_REQUEST_PAGE: &str = "https://github.com/vim-jp/reading-vimrc/wiki/Request";

/// Site repository read when none is configured.
pub const DEFAULT_GITHUB_REPOS: &str = "vim-jp/reading-vimrc";

/// Sessions are scheduled in JST.
const DEFAULT_TIMEZONE_OFFSET_HOURS: i32 = 9;

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".reading-vimrc";

const CONFIG_SUBDIR: &str = "config";
const WORK_SUBDIR: &str = "work";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the bot state directory.
///
/// The state directory is determined by:
/// 1. `READING_VIMRC_STATE_DIR` environment variable if set
/// 2. `~/.reading-vimrc` if home directory is available
/// 3. `.reading-vimrc` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the .env.local file path.
///
/// Environment file for secrets (API keys, tokens).
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Expand `~` and `$VAR` in a user supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    shellexpand::full(path)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .unwrap_or_else(|_| PathBuf::from(path))
}

/// Ensure the state directory and its config subdirectory exist.
///
/// # Errors
/// Returns an error if any directory cannot be created.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(config_dir())?;
    Ok(())
}

/// Settings of the bot, read from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// The only chat the bot listens in; `None` listens everywhere.
    pub chat_id: Option<i64>,
    /// Users allowed to run admin commands.
    pub admin_users: Vec<String>,
    /// Site URL, ending with `/`.
    pub homepage: String,
    pub request_page: String,
    /// `owner/repo` of the site repository.
    pub github_repos: Option<String>,
    /// Token with `write:public_key` scope.
    pub github_api_token: Option<String>,
    pub work_dir: PathBuf,
    pub git_user_name: Option<String>,
    pub git_user_email: Option<String>,
    /// Webhook notified when a session starts.
    pub activity_hook_url: Option<String>,
    /// Time zone of the schedule dates.
    pub schedule_offset: FixedOffset,
}

impl BotConfig {
    /// Read the settings from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let chat_id = get(CHAT_ID_ENV)
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .map_err(|_| CoreError::Config(format!("{} is not a chat id: {}", CHAT_ID_ENV, v)))
            })
            .transpose()?;

        let admin_users = get(ADMIN_USERS_ENV)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let hours = get(TIMEZONE_OFFSET_ENV)
            .map(|v| {
                v.trim().parse::<i32>().map_err(|_| {
                    CoreError::Config(format!("{} is not an hour offset: {}", TIMEZONE_OFFSET_ENV, v))
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_TIMEZONE_OFFSET_HOURS);
        let schedule_offset = FixedOffset::east_opt(hours * 3600).ok_or_else(|| {
            CoreError::Config(format!("{} out of range: {}", TIMEZONE_OFFSET_ENV, hours))
        })?;

        let mut homepage = get(HOMEPAGE_ENV).unwrap_or_else(|| DEFAULT_HOMEPAGE.to_string());
        if !homepage.ends_with('/') {
            homepage.push('/');
        }

        Ok(Self {
            chat_id,
            admin_users,
            homepage,
            request_page: get(REQUEST_PAGE_ENV).unwrap_or_else(|| DEFAULT_REQUEST_PAGE.to_string()),
            github_repos: get(GITHUB_REPOS_ENV),
            github_api_token: get(GITHUB_API_TOKEN_ENV),
            work_dir: get(WORK_DIR_ENV)
                .map(|dir| expand_path(&dir))
                .unwrap_or_else(|| state_dir().join(WORK_SUBDIR)),
            git_user_name: get(GIT_USER_NAME_ENV),
            git_user_email: get(GIT_USER_EMAIL_ENV),
            activity_hook_url: get(ACTIVITY_HOOK_URL_ENV),
            schedule_offset,
        })
    }

    /// Whether `user` may run admin commands.
    pub fn is_admin(&self, user: &str) -> bool {
        !user.is_empty() && self.admin_users.iter().any(|admin| admin == user)
    }

    /// Whether the site and wiki repositories can be managed.
    pub fn repos_enabled(&self) -> bool {
        self.github_repos.is_some() && self.github_api_token.is_some()
    }

    /// Raw URL of the published schedule file.
    pub fn next_yaml_url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/gh-pages/_data/next.yml",
            self.github_repos.as_deref().unwrap_or(DEFAULT_GITHUB_REPOS)
        )
    }

    /// URL of the archive page of session `id`.
    pub fn archive_url(&self, id: u32) -> String {
        format!("{}archive/{:03}.html", self.homepage, id)
    }
}
