//! Access to files hosted on GitHub.
//!
//! Session files are referenced by their `github.com/<owner>/<repo>/blob/<ref>/<path>`
//! URLs. Before a session starts each file is pinned to a commit so that
//! line numbers stay valid while people read.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;
use vimrc_models::VimrcFile;

use crate::error::{CoreError, Result};

/// GitHub REST API endpoint.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const RAW_HOST: &str = "raw.githubusercontent.com";
const USER_AGENT: &str = "reading-vimrc-bot";

static REPOSITORY_PLACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://github\.com/([^/]+/[^/]+)").expect("Invalid repository place regex")
});

static BLOB_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"blob/[^/]+/").expect("Invalid blob ref regex"));

/// Read-only access to remote text and repository heads.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// GET `url` and return the body.
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// Hash of the latest commit of the repository `url` belongs to.
    async fn latest_commit(&self, url: &str) -> Result<String>;
}

/// `owner/repo` of a github.com URL.
pub fn repository_place(url: &str) -> Option<String> {
    REPOSITORY_PLACE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Raw content URL of a `github.com/.../blob/<ref>/<path>` URL.
pub fn raw_url(url: &str) -> Result<String> {
    let mut parsed = Url::parse(url).map_err(|_| CoreError::InvalidUrl(url.to_string()))?;
    let segments: Vec<String> = parsed
        .path_segments()
        .ok_or_else(|| CoreError::InvalidUrl(url.to_string()))?
        .map(str::to_string)
        .collect();
    if segments.len() < 4 {
        return Err(CoreError::InvalidUrl(url.to_string()));
    }

    // owner/repo/blob/ref/path -> owner/repo/ref/path
    let path: Vec<&str> = segments
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 2)
        .map(|(_, s)| s.as_str())
        .collect();
    parsed
        .set_host(Some(RAW_HOST))
        .map_err(|_| CoreError::InvalidUrl(url.to_string()))?;
    parsed.set_path(&path.join("/"));
    Ok(parsed.to_string())
}

/// Rewrite `vimrc` so both URLs point at `hash`.
pub fn pin_vimrc(vimrc: &VimrcFile, hash: &str) -> VimrcFile {
    let url = BLOB_REF
        .replace(&vimrc.url, format!("blob/{}/", hash).as_str())
        .into_owned();
    let raw_url = BLOB_REF
        .replace(
            &vimrc.url.replacen("https://github", "https://raw.githubusercontent", 1),
            format!("{}/", hash).as_str(),
        )
        .into_owned();
    VimrcFile {
        url,
        raw_url: Some(raw_url),
        name: vimrc.name.clone(),
        hash: Some(hash.to_string()),
    }
}

/// Pin `vimrc` to its recorded hash, or to the repository head if none.
pub async fn fix_vimrc(source: &dyn RemoteSource, vimrc: &VimrcFile) -> Result<VimrcFile> {
    let hash = match &vimrc.hash {
        Some(hash) => hash.clone(),
        None => source.latest_commit(&vimrc.url).await?,
    };
    Ok(pin_vimrc(vimrc, &hash))
}

/// Number of `\n` separated lines, counting a trailing empty piece.
pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

/// HTTP implementation of [`RemoteSource`].
///
/// Head commits are cached per repository for the life of the client.
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    hashes: RwLock<HashMap<String, String>>,
}

impl GithubClient {
    pub fn new() -> Self {
        Self::with_api_base(GITHUB_API_BASE)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            hashes: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSource for GithubClient {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    async fn latest_commit(&self, url: &str) -> Result<String> {
        let place = repository_place(url).ok_or_else(|| CoreError::InvalidUrl(url.to_string()))?;
        if let Some(hash) = self.hashes.read().await.get(&place) {
            return Ok(hash.clone());
        }

        let api_url = format!("{}/repos/{}/commits/HEAD", self.api_base, place);
        let response = self
            .client
            .get(&api_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github.VERSION.sha")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Fetch {
                url: api_url,
                status: status.as_u16(),
            });
        }

        let hash = response.text().await?.trim().to_string();
        debug!(repository = %place, hash = %hash, "resolved head commit");
        self.hashes.write().await.insert(place, hash.clone());
        Ok(hash)
    }
}
