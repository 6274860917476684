//! Local working copy of a single remote repository.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, trace};

use crate::{GitError, Result};

/// Branch reset to when none is configured.
const DEFAULT_FETCH_BRANCH: &str = "master";

/// Ref pushed when no branch is configured.
const DEFAULT_PUSH_REF: &str = "HEAD";

/// Which path `setup` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The working directory was cloned.
    Created,
    /// The working directory existed and was reset to the remote.
    Updated,
}

/// Author and committer used for commits made by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl CommitIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A working copy bound to one remote and branch.
///
/// There is no internal locking. Callers must not run two operations on the
/// same instance at once.
#[derive(Debug, Clone)]
pub struct GitRepository {
    /// Remote URL.
    repos_url: String,
    /// Local working directory.
    work_dir: PathBuf,
    /// Private key handed to ssh.
    key_path: PathBuf,
    branch: Option<String>,
    identity: Option<CommitIdentity>,
    /// Path to git binary.
    git_path: PathBuf,
}

impl GitRepository {
    /// Create a new GitRepository.
    ///
    /// Verifies that git is available in PATH. Nothing touches the disk
    /// until `setup` is called.
    ///
    /// # Errors
    ///
    /// Returns `GitError::NotFound` if git is not available.
    pub fn new(
        repos_url: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
        branch: Option<&str>,
    ) -> Result<Self> {
        let git_path = Self::find_git()?;
        debug!(path = %git_path.display(), "git found");
        Ok(Self {
            repos_url: repos_url.into(),
            work_dir: work_dir.into(),
            key_path: key_path.into(),
            branch: branch.map(str::to_string),
            identity: None,
            git_path,
        })
    }

    /// Commit as `identity` instead of the ambient git configuration.
    pub fn with_identity(mut self, identity: CommitIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Check if git is available in PATH.
    pub fn is_available() -> bool {
        Self::find_git().is_ok()
    }

    fn find_git() -> Result<PathBuf> {
        which::which("git").map_err(|_| GitError::NotFound("git"))
    }

    pub fn repos_url(&self) -> &str {
        &self.repos_url
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Clone the remote if needed, otherwise bring the working copy up to date.
    pub async fn setup(&self) -> Result<SetupOutcome> {
        if self.setup_work_dir().await? {
            return Ok(SetupOutcome::Created);
        }
        self.update_to_latest().await?;
        Ok(SetupOutcome::Updated)
    }

    /// Clone into the working directory unless it already exists.
    ///
    /// Returns whether a clone happened.
    pub async fn setup_work_dir(&self) -> Result<bool> {
        if tokio::fs::try_exists(&self.work_dir).await? {
            return Ok(false);
        }

        info!(url = %self.repos_url, dir = %self.work_dir.display(), "cloning repository");
        let work_dir = self.work_dir.to_string_lossy().into_owned();
        let mut args = vec!["clone", self.repos_url.as_str(), work_dir.as_str()];
        if let Some(branch) = &self.branch {
            args.push("--branch");
            args.push(branch);
        }
        self.run_git(&args, false).await?;
        Ok(true)
    }

    /// Fetch the remote and hard reset the working tree to it.
    ///
    /// Local modifications are discarded.
    pub async fn update_to_latest(&self) -> Result<()> {
        let branch = self.branch.as_deref().unwrap_or(DEFAULT_FETCH_BRANCH);
        debug!(dir = %self.work_dir.display(), branch = %branch, "updating to latest");

        self.run_git(&["fetch"], true).await?;
        let target = format!("origin/{}", branch);
        self.run_git(&["reset", "--hard", target.as_str()], true).await?;
        Ok(())
    }

    /// Stage everything, commit with `message` and push.
    pub async fn commit_and_push(&self, message: &str) -> Result<String> {
        self.run_git(&["add", "."], true).await?;
        self.run_git(&["commit", "--message", message], true).await?;
        let branch = self.branch.as_deref().unwrap_or(DEFAULT_PUSH_REF);
        self.run_git(&["push", "origin", branch], true).await?;
        info!(dir = %self.work_dir.display(), message = %message, "pushed");
        Ok(message.to_string())
    }

    /// The ssh command git uses to reach the remote with the deploy key.
    pub fn ssh_command(&self) -> String {
        format!(
            "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
            shell_quote(&self.key_path.to_string_lossy())
        )
    }

    /// Run git and return its stdout.
    async fn run_git(&self, args: &[&str], in_work_dir: bool) -> Result<String> {
        trace!(args = ?args, "running git command");

        let mut command = Command::new(&self.git_path);
        command
            .args(args)
            .env("GIT_SSH_COMMAND", self.ssh_command())
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        if in_work_dir {
            command.current_dir(&self.work_dir);
        }
        if let Some(identity) = &self.identity {
            command
                .env("GIT_AUTHOR_NAME", &identity.name)
                .env("GIT_AUTHOR_EMAIL", &identity.email)
                .env("GIT_COMMITTER_NAME", &identity.name)
                .env("GIT_COMMITTER_EMAIL", &identity.email);
        }

        let output = command.output().await?;
        trace!(
            status = %output.status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "git command completed"
        );

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        Err(GitError::CommandFailed {
            command: "git".to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            code: output.status.code(),
            signal: exit_signal(&output.status),
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Quote a word for `sh`.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}
