//! Reading vimrc core - shared logic for the bot and the content store.
//!
//! - **config**: state paths and environment-driven settings
//! - **github**: remote file access and commit pinning of session files
//! - **progressor**: the in-memory session state machine
//! - **reference**: `L10-L20` style line references and plugin links

pub mod config;
pub mod error;
pub mod github;
pub mod progressor;
pub mod reference;

pub use config::{
    config_dir, ensure_all_dirs, env_file, expand_path, state_dir, BotConfig,
};
pub use error::{CoreError, Result};
pub use github::{
    fix_vimrc, line_count, pin_vimrc, raw_url, repository_place, GithubClient, RemoteSource,
};
pub use progressor::{MessageLog, NameMatcher, Progressor, SessionStatus};
pub use reference::{
    extract_plugin_urls, parse_reference, resolve, Excerpt, LineRange, PluginLink, Quote,
    QuotedFile, ReferenceRequest,
};
