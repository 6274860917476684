//! Git-backed content store for the site and the wiki.
//!
//! Working copies live under the base work directory:
//! ```text
//! work_dir/
//! ├── .ssh/bot_deploy_rsa   # deploy key
//! ├── gh-pages/             # site, branch gh-pages
//! └── wiki/                 # wiki, branch master
//! ```
//!
//! Each mutating operation holds the repository's lock from the pull to the
//! push, so overlapping commands run one after another.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};
use vimrc_core::{line_count, raw_url, BotConfig, RemoteSource};
use vimrc_git::{CommitIdentity, DeployKey, GitRepository};
use vimrc_models::{ArchiveVimrc, NextVimrc};

use crate::archive::{
    archive_entry, archive_page, archive_page_path, next_document, parse_archives, parse_next,
    ARCHIVES_YAML, NEXT_YAML,
};
use crate::atomic::{append_file, read_file, write_file};
use crate::error::{RepoError, Result};
use crate::schedule::{compute_next, NextRequest};
use crate::wiki::{request_line, RequestFile, REQUEST_FILE};

const SITE_BRANCH: &str = "gh-pages";
const WIKI_BRANCH: &str = "master";
const SITE_DIR: &str = "gh-pages";
const WIKI_DIR: &str = "wiki";
const KEY_DIR: &str = ".ssh";
const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Site and wiki working copies of one GitHub repository.
pub struct ContentStore {
    /// `owner/repo` of the site.
    repository: String,
    work_dir: PathBuf,
    api_token: String,
    identity: Option<CommitIdentity>,
    /// Remote URLs replacing the GitHub SSH ones.
    remote_urls: Option<(String, String)>,
    schedule_offset: FixedOffset,
    source: Arc<dyn RemoteSource>,
    site: Option<Mutex<GitRepository>>,
    wiki: Option<Mutex<GitRepository>>,
}

impl ContentStore {
    pub fn new(
        repository: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        api_token: impl Into<String>,
        source: Arc<dyn RemoteSource>,
    ) -> Self {
        Self {
            repository: repository.into(),
            work_dir: work_dir.into(),
            api_token: api_token.into(),
            identity: None,
            remote_urls: None,
            schedule_offset: FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix()),
            source,
            site: None,
            wiki: None,
        }
    }

    /// Build a store from the bot settings, if the repositories are configured.
    pub fn from_config(config: &BotConfig, source: Arc<dyn RemoteSource>) -> Option<Self> {
        let repository = config.github_repos.as_ref()?;
        let token = config.github_api_token.as_ref()?;
        let mut store = Self::new(repository, &config.work_dir, token, source)
            .with_schedule_offset(config.schedule_offset);
        if let (Some(name), Some(email)) = (&config.git_user_name, &config.git_user_email) {
            store = store.with_identity(CommitIdentity::new(name, email));
        }
        Some(store)
    }

    pub fn with_identity(mut self, identity: CommitIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Time zone the schedule dates are written in.
    pub fn with_schedule_offset(mut self, offset: FixedOffset) -> Self {
        self.schedule_offset = offset;
        self
    }

    /// Clone from `site` and `wiki` instead of GitHub over SSH.
    pub fn with_remote_urls(mut self, site: impl Into<String>, wiki: impl Into<String>) -> Self {
        self.remote_urls = Some((site.into(), wiki.into()));
        self
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn is_setup(&self) -> bool {
        self.site.is_some() && self.wiki.is_some()
    }

    /// Prepare the deploy key and both working copies.
    pub async fn setup(&mut self) -> Result<()> {
        let key_dir = self.work_dir.join(KEY_DIR);
        tokio::fs::create_dir_all(&key_dir)
            .await
            .map_err(|source| RepoError::WriteError {
                path: key_dir.clone(),
                source,
            })?;
        let key_path = DeployKey::new(&key_dir, &self.api_token).setup().await?;

        let (site_url, wiki_url) = self.remote_urls.clone().unwrap_or_else(|| {
            (
                format!("git@github.com:{}", self.repository),
                format!("git@github.com:{}.wiki", self.repository),
            )
        });
        let mut site = GitRepository::new(
            site_url,
            self.work_dir.join(SITE_DIR),
            key_path.clone(),
            Some(SITE_BRANCH),
        )?;
        let mut wiki = GitRepository::new(
            wiki_url,
            self.work_dir.join(WIKI_DIR),
            key_path,
            Some(WIKI_BRANCH),
        )?;
        if let Some(identity) = &self.identity {
            site = site.with_identity(identity.clone());
            wiki = wiki.with_identity(identity.clone());
        }

        let (site_outcome, wiki_outcome) = futures::try_join!(site.setup(), wiki.setup())?;
        info!(
            repository = %self.repository,
            site = ?site_outcome,
            wiki = ?wiki_outcome,
            "content repositories ready"
        );

        self.site = Some(Mutex::new(site));
        self.wiki = Some(Mutex::new(wiki));
        Ok(())
    }

    fn site(&self) -> Result<&Mutex<GitRepository>> {
        self.site.as_ref().ok_or(RepoError::SetupNotCalled)
    }

    fn wiki(&self) -> Result<&Mutex<GitRepository>> {
        self.wiki.as_ref().ok_or(RepoError::SetupNotCalled)
    }

    /// The upcoming session as recorded in the site working copy.
    pub async fn read_next_yaml(&self) -> Result<NextVimrc> {
        let site = self.site()?.lock().await;
        let path = site.work_dir().join(NEXT_YAML);
        parse_next(&read_file(&path).await?)?.ok_or(RepoError::EmptySchedule(path))
    }

    /// Every archived session.
    pub async fn read_archive_yaml(&self) -> Result<Vec<ArchiveVimrc>> {
        let site = self.site()?.lock().await;
        parse_archives(&read_file(&site.work_dir().join(ARCHIVES_YAML)).await?)
    }

    /// Authors whose files were already read.
    pub async fn read_target_members(&self) -> Result<HashSet<String>> {
        Ok(self
            .read_archive_yaml()
            .await?
            .into_iter()
            .map(|entry| entry.author.name)
            .collect())
    }

    /// Archive a finished session and drop its author from the request queue.
    pub async fn finish(&self, result: &ArchiveVimrc) -> Result<()> {
        {
            let site = self.site()?.lock().await;
            site.update_to_latest().await?;

            let dir = site.work_dir();
            append_file(&dir.join(ARCHIVES_YAML), &archive_entry(result)?).await?;
            write_file(dir.join(archive_page_path(result.id)), archive_page(result.id)).await?;
            site.commit_and_push(&format!("Add archive for #{}", result.id))
                .await?;
            info!(id = result.id, author = %result.author.name, "session archived");
        }

        self.remove_wiki_entry(result).await?;
        Ok(())
    }

    /// Write the next session from `tokens` (file URLs and a part label).
    pub async fn next<S: AsRef<str>>(&self, tokens: &[S], result: &ArchiveVimrc) -> Result<NextVimrc> {
        let request = NextRequest::parse(tokens)?;

        let site = self.site()?.lock().await;
        site.update_to_latest().await?;

        let path = site.work_dir().join(NEXT_YAML);
        let current = parse_next(&read_file(&path).await?)?
            .ok_or_else(|| RepoError::EmptySchedule(path.clone()))?;
        let next = compute_next(current, &request, result, Utc::now(), self.schedule_offset)?;

        write_file(path, next_document(&next)?).await?;
        site.commit_and_push(&format!(
            "Update the next information: #{} {}",
            next.id, next.author.name
        ))
        .await?;
        info!(id = next.id, author = %next.author.name, "next session updated");
        Ok(next)
    }

    /// Queue `author` on the request page. Returns whether a row was added.
    pub async fn add_wiki_entry(
        &self,
        requester: &str,
        author: &str,
        url: &str,
        comment: Option<&str>,
    ) -> Result<bool> {
        let wiki = self.wiki()?.lock().await;
        wiki.update_to_latest().await?;

        let path = wiki.work_dir().join(REQUEST_FILE);
        let mut file = RequestFile::parse(&read_file(&path).await?);
        if file.has_author(author) {
            debug!(author, "request already queued");
            return Ok(false);
        }

        let lines = line_count(&self.source.fetch_text(&raw_url(url)?).await?);
        if !file.add(author, request_line(author, lines, requester, url, comment)) {
            return Ok(false);
        }

        write_file(path, file.to_text()).await?;
        wiki.commit_and_push(&format!("Add {}", author)).await?;
        info!(author, requester, lines, "request added");
        Ok(true)
    }

    /// Drop the author of `result` from the request page.
    pub async fn remove_wiki_entry(&self, result: &ArchiveVimrc) -> Result<bool> {
        let name = &result.author.name;
        let wiki = self.wiki()?.lock().await;
        wiki.update_to_latest().await?;

        let path = wiki.work_dir().join(REQUEST_FILE);
        let mut file = RequestFile::parse(&read_file(&path).await?);
        if !file.remove(name) {
            return Ok(false);
        }

        write_file(path, file.to_text()).await?;
        wiki.commit_and_push(&format!("Remove {} (#{})", name, result.id))
            .await?;
        info!(author = %name, id = result.id, "request removed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vimrc_models::Author;

    struct Offline;

    #[async_trait]
    impl RemoteSource for Offline {
        async fn fetch_text(&self, url: &str) -> vimrc_core::Result<String> {
            Err(vimrc_core::CoreError::InvalidUrl(url.to_string()))
        }

        async fn latest_commit(&self, url: &str) -> vimrc_core::Result<String> {
            Err(vimrc_core::CoreError::InvalidUrl(url.to_string()))
        }
    }

    fn store() -> ContentStore {
        ContentStore::new("vim-jp/reading-vimrc", "/nonexistent", "token", Arc::new(Offline))
    }

    fn result() -> ArchiveVimrc {
        ArchiveVimrc::from(NextVimrc {
            id: 1,
            date: "2024-01-01 23:00".to_string(),
            author: Author::new("alice", "https://github.com/alice"),
            vimrcs: Vec::new(),
            part: None,
            other: None,
        })
    }

    #[tokio::test]
    async fn test_operations_need_setup() {
        let store = store();
        assert!(!store.is_setup());
        assert!(matches!(store.read_next_yaml().await, Err(RepoError::SetupNotCalled)));
        assert!(matches!(store.finish(&result()).await, Err(RepoError::SetupNotCalled)));
        assert!(matches!(
            store.add_wiki_entry("bob", "alice", "https://github.com/alice/d/blob/master/vimrc", None).await,
            Err(RepoError::SetupNotCalled)
        ));
        assert!(matches!(
            store.remove_wiki_entry(&result()).await,
            Err(RepoError::SetupNotCalled)
        ));
    }

    #[tokio::test]
    async fn test_next_validates_tokens_first() {
        let store = store();
        let tokens = ["hello"];
        assert!(matches!(
            store.next(&tokens, &result()).await,
            Err(RepoError::MissingParameter)
        ));
        assert!(matches!(
            store.next(&["後編"], &result()).await,
            Err(RepoError::SetupNotCalled)
        ));
    }

    #[test]
    fn test_from_config_needs_repository_and_token() {
        let config = BotConfig::from_lookup(|_| None).unwrap();
        assert!(ContentStore::from_config(&config, Arc::new(Offline)).is_none());

        let config = BotConfig::from_lookup(|key| match key {
            "READING_VIMRC_GITHUB_REPOS" => Some("vim-jp/reading-vimrc".to_string()),
            "READING_VIMRC_GITHUB_API_TOKEN" => Some("token".to_string()),
            _ => None,
        })
        .unwrap();
        let store = ContentStore::from_config(&config, Arc::new(Offline)).unwrap();
        assert_eq!(store.repository(), "vim-jp/reading-vimrc");
    }
}
