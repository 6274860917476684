//! Content store for the reading vimrc site and wiki.
//!
//! The site repository (`gh-pages`) holds the schedule and the archive, the
//! wiki holds the request queue. Both are cloned locally over SSH with a
//! deploy key and updated through pull, edit, commit and push cycles.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vimrc_core::GithubClient;
//! use vimrc_repos::ContentStore;
//!
//! # async fn run() -> vimrc_repos::Result<()> {
//! let mut store = ContentStore::new(
//!     "vim-jp/reading-vimrc",
//!     "/var/lib/reading-vimrc/work",
//!     "ghp_token",
//!     Arc::new(GithubClient::new()),
//! );
//! store.setup().await?;
//!
//! let next = store.read_next_yaml().await?;
//! println!("next: #{} {}", next.id, next.author.name);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod atomic;
pub mod error;
pub mod schedule;
pub mod store;
pub mod wiki;

pub use error::{RepoError, Result};
pub use schedule::{compute_next, github_url_info, next_week, NextRequest, UrlInfo};
pub use store::ContentStore;
pub use wiki::{request_line, RequestFile};
