//! Error types for content store operations.

use std::path::PathBuf;

use thiserror::Error;
use vimrc_core::CoreError;
use vimrc_git::GitError;

/// Errors that can occur while updating the site or wiki.
#[derive(Error, Debug)]
pub enum RepoError {
    /// An operation ran before `setup`.
    #[error("repositories are not set up")]
    SetupNotCalled,

    /// `next` got neither file URLs nor a part.
    #[error("next needs file URLs or a part")]
    MissingParameter,

    /// The schedule date could not be read.
    #[error("invalid schedule date: {0}")]
    InvalidDate(String),

    /// `_data/next.yml` holds no record.
    #[error("no record in {}", .0.display())]
    EmptySchedule(PathBuf),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failed to read a file.
    #[error("failed to read {}: {source}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {}: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for content store operations.
pub type Result<T> = std::result::Result<T, RepoError>;
