//! Error types for git and deploy key operations.

use thiserror::Error;

/// Errors that can occur while driving git or registering keys.
#[derive(Error, Debug)]
pub enum GitError {
    /// Required binary not found in PATH.
    #[error("{0} not found in PATH")]
    NotFound(&'static str),

    /// An external command exited unsuccessfully.
    #[error("`{command} {}` failed ({}): {}", .args.join(" "), exit_label(.code, .signal), .stderr.trim())]
    CommandFailed {
        command: String,
        args: Vec<String>,
        code: Option<i32>,
        signal: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The hosting API rejected the public key.
    #[error("public key registration failed with status {status}: {body}")]
    Registration { status: u16, body: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>, signal: &Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("exit code {}", code),
        (None, Some(signal)) => format!("signal {}", signal),
        (None, None) => "unknown status".to_string(),
    }
}

impl From<reqwest::Error> for GitError {
    fn from(e: reqwest::Error) -> Self {
        GitError::Http(e.to_string())
    }
}

/// Result type alias for git operations.
pub type Result<T> = std::result::Result<T, GitError>;
