//! Git plumbing for the reading vimrc bot.
//!
//! This crate keeps local working copies of remote repositories in sync:
//! - Clone on first use, fetch + hard reset afterwards
//! - Commit every change and push
//! - Authenticate with a dedicated deploy key passed per invocation
//! - Generate and register that deploy key once
//!
//! # Example
//!
//! ```no_run
//! use vimrc_git::{DeployKey, GitRepository};
//!
//! # async fn run() -> vimrc_git::Result<()> {
//! let key_path = DeployKey::new("/srv/bot/.ssh", "ghp_token").setup().await?;
//!
//! let repo = GitRepository::new(
//!     "git@github.com:vim-jp/reading-vimrc",
//!     "/srv/bot/gh-pages",
//!     key_path,
//!     Some("gh-pages"),
//! )?;
//! repo.setup().await?;
//! repo.commit_and_push("Update the next information").await?;
//! # Ok(())
//! # }
//! ```

pub mod deploy_key;
pub mod error;
pub mod repository;

pub use deploy_key::DeployKey;
pub use error::{GitError, Result};
pub use repository::{CommitIdentity, GitRepository, SetupOutcome};
