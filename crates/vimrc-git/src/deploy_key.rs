//! Deploy key bootstrap.
//!
//! The bot pushes with its own RSA key. The key is generated once per key
//! directory and its public half is registered on the GitHub account owning
//! the API token.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{GitError, Result};

/// File name of the private key inside the key directory.
pub const DEFAULT_KEY_FILE_NAME: &str = "bot_deploy_rsa";

/// GitHub REST API endpoint.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const KEY_BITS: &str = "4096";
const KEY_COMMENT: &str = "A key for auto deploy";
const KEY_TITLE: &str = "A key for auto deploy from bot";
const USER_AGENT: &str = "reading-vimrc-bot";

/// Ensures a deploy key exists on disk and is known to GitHub.
#[derive(Debug, Clone)]
pub struct DeployKey {
    key_dir: PathBuf,
    api_token: String,
    key_file_name: String,
    api_base: String,
    client: reqwest::Client,
}

impl DeployKey {
    pub fn new(key_dir: impl Into<PathBuf>, api_token: impl Into<String>) -> Self {
        Self {
            key_dir: key_dir.into(),
            api_token: api_token.into(),
            key_file_name: DEFAULT_KEY_FILE_NAME.to_string(),
            api_base: GITHUB_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_key_file_name(mut self, name: impl Into<String>) -> Self {
        self.key_file_name = name.into();
        self
    }

    /// Point registration at another API host (GitHub Enterprise, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Path of the private key.
    pub fn key_path(&self) -> PathBuf {
        self.key_dir.join(&self.key_file_name)
    }

    /// Path of the public key written next to the private key.
    pub fn public_key_path(&self) -> PathBuf {
        self.key_dir.join(format!("{}.pub", self.key_file_name))
    }

    /// Return the key path, generating and registering a key first if none exists.
    ///
    /// An existing key file is trusted as registered. The private key is
    /// written before registration is attempted, so a failed registration
    /// leaves a local key behind that the next call will reuse.
    pub async fn setup(&self) -> Result<PathBuf> {
        let key_path = self.key_path();
        if tokio::fs::try_exists(&key_path).await? {
            debug!(path = %key_path.display(), "reusing existing deploy key");
            return Ok(key_path);
        }

        tokio::fs::create_dir_all(&self.key_dir).await?;
        let public_key = self.generate(&key_path).await?;
        if let Err(e) = self.register(&public_key).await {
            warn!(
                path = %key_path.display(),
                error = %e,
                "deploy key written but not registered; later setups will not retry registration"
            );
            return Err(e);
        }

        info!(path = %key_path.display(), "deploy key generated and registered");
        Ok(key_path)
    }

    /// Run ssh-keygen and return the public key text.
    async fn generate(&self, key_path: &Path) -> Result<String> {
        let keygen = which::which("ssh-keygen").map_err(|_| GitError::NotFound("ssh-keygen"))?;
        let path = key_path.to_string_lossy().into_owned();
        let args = [
            "-t", "rsa", "-b", KEY_BITS, "-N", "", "-C", KEY_COMMENT, "-f", path.as_str(), "-q",
        ];

        debug!(path = %path, "generating deploy key");
        let output = Command::new(keygen)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: "ssh-keygen".to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                code: output.status.code(),
                signal: None,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let public_key = tokio::fs::read_to_string(self.public_key_path()).await?;
        Ok(public_key.trim().to_string())
    }

    /// Register the public key on the token owner's account.
    async fn register(&self, public_key: &str) -> Result<()> {
        let url = format!("{}/user/keys", self.api_base);
        let body = serde_json::json!({
            "title": KEY_TITLE,
            "key": public_key,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitError::Registration {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
