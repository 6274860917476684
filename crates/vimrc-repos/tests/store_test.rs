//! Content store against local bare repositories.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use vimrc_core::{CoreError, RemoteSource};
use vimrc_git::{CommitIdentity, GitRepository};
use vimrc_models::{ArchiveVimrc, Author, NextVimrc, VimrcFile};
use vimrc_repos::{ContentStore, RepoError};

const NEXT_YML: &str = "- id: 5\n  date: 2024-01-01 23:00\n  author:\n    name: alice\n    url: https://github.com/alice\n  vimrcs:\n  - url: https://github.com/alice/dots/blob/master/vimrc\n    name: vimrc\n    hash: null\n  part: null\n";

const ARCHIVES_YML: &str = "- id: 4\n  date: 2023-12-25 23:00\n  author:\n    name: carol\n    url: https://github.com/carol\n  vimrcs: []\n  part: null\n  members:\n  - dave\n";

const REQUEST_MD: &str = "# Request\n\nauthor | lines | requester | comment | link\n--- | --- | --- | --- | ---\nalice | 10 | bob | | [リンク](https://github.com/alice/dots/blob/master/vimrc)\n...\n";

/// Serves a fixed file body and counts fetches.
struct FakeSource {
    fetches: AtomicUsize,
}

#[async_trait]
impl RemoteSource for FakeSource {
    async fn fetch_text(&self, _url: &str) -> vimrc_core::Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok("set number\nset hidden\nsyntax on".to_string())
    }

    async fn latest_commit(&self, url: &str) -> vimrc_core::Result<String> {
        Err(CoreError::InvalidUrl(url.to_string()))
    }
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Seed", "-c", "user.email=seed@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Create `<root>/<name>.git` whose `branch` holds `files`.
fn seed_remote(root: &Path, name: &str, branch: &str, files: &[(&str, &str)]) -> PathBuf {
    let seed = root.join(format!("{}-seed", name));
    fs::create_dir_all(&seed).unwrap();
    git(&seed, &["init", "-q"]);
    git(&seed, &["checkout", "-q", "-b", branch]);
    for (path, content) in files {
        let path = seed.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    git(&seed, &["add", "."]);
    git(&seed, &["commit", "-q", "-m", "seed"]);

    let remote = root.join(format!("{}.git", name));
    git(
        root,
        &["clone", "-q", "--bare", seed.to_str().unwrap(), remote.to_str().unwrap()],
    );
    remote
}

fn subjects(remote: &Path, branch: &str) -> Vec<String> {
    git(remote, &["log", "--format=%s", branch])
        .lines()
        .map(str::to_string)
        .collect()
}

struct Fixture {
    root: TempDir,
    site: PathBuf,
    wiki: PathBuf,
    source: Arc<FakeSource>,
    store: ContentStore,
}

impl Fixture {
    fn work(&self) -> PathBuf {
        self.root.path().join("work")
    }

    fn site_file(&self, path: &str) -> String {
        fs::read_to_string(self.work().join("gh-pages").join(path)).unwrap()
    }

    fn wiki_file(&self, path: &str) -> String {
        fs::read_to_string(self.work().join("wiki").join(path)).unwrap()
    }
}

async fn fixture(next_yml: &str) -> Option<Fixture> {
    if !GitRepository::is_available() {
        return None;
    }
    let root = tempfile::tempdir().unwrap();
    let site = seed_remote(
        root.path(),
        "site",
        "gh-pages",
        &[("_data/next.yml", next_yml), ("_data/archives.yml", ARCHIVES_YML)],
    );
    let wiki = seed_remote(root.path(), "wiki", "master", &[("Request.md", REQUEST_MD)]);

    // An existing key keeps setup away from ssh-keygen and the GitHub API.
    let key_dir = root.path().join("work/.ssh");
    fs::create_dir_all(&key_dir).unwrap();
    fs::write(key_dir.join("bot_deploy_rsa"), "key").unwrap();

    let source = Arc::new(FakeSource {
        fetches: AtomicUsize::new(0),
    });
    let mut store = ContentStore::new(
        "vim-jp/reading-vimrc",
        root.path().join("work"),
        "token",
        source.clone(),
    )
    .with_remote_urls(site.to_string_lossy(), wiki.to_string_lossy())
    .with_identity(CommitIdentity::new("Bot", "bot@example.com"));
    store.setup().await.unwrap();

    Some(Fixture {
        root,
        site,
        wiki,
        source,
        store,
    })
}

fn result(id: u32, author: &str) -> ArchiveVimrc {
    let mut result = ArchiveVimrc::from(NextVimrc {
        id,
        date: "2024-01-01 23:00".to_string(),
        author: Author::new(author, format!("https://github.com/{}", author)),
        vimrcs: vec![VimrcFile::new(
            format!("https://github.com/{}/dots/blob/master/vimrc", author),
            "vimrc",
        )],
        part: None,
        other: None,
    });
    result.members = vec!["bob".to_string(), "dave".to_string()];
    result.log = Some("https://t.me/c/1/100".to_string());
    result
}

#[tokio::test]
async fn test_setup_reads_site_data() {
    let Some(fx) = fixture(NEXT_YML).await else {
        return;
    };
    assert!(fx.store.is_setup());

    let next = fx.store.read_next_yaml().await.unwrap();
    assert_eq!(next.id, 5);
    assert_eq!(next.author.name, "alice");

    let members = fx.store.read_target_members().await.unwrap();
    assert!(members.contains("carol"));
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn test_finish_appends_archive_and_removes_request() {
    let Some(fx) = fixture(NEXT_YML).await else {
        return;
    };

    fx.store.finish(&result(5, "alice")).await.unwrap();

    let archives = fx.site_file("_data/archives.yml");
    assert!(archives.starts_with(ARCHIVES_YML));
    let records: Vec<ArchiveVimrc> = serde_yaml::from_str(&archives).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].id, 5);
    assert_eq!(records[1].members, vec!["bob", "dave"]);

    assert!(fx.site_file("archive/005.md").contains("title: 第5回 vimrc読書会"));
    assert_eq!(subjects(&fx.site, "gh-pages")[0], "Add archive for #5");

    assert!(!fx.wiki_file("Request.md").contains("alice |"));
    assert_eq!(subjects(&fx.wiki, "master")[0], "Remove alice (#5)");
}

#[tokio::test]
async fn test_remove_without_row_does_not_push() {
    let Some(fx) = fixture(NEXT_YML).await else {
        return;
    };

    let changed = fx.store.remove_wiki_entry(&result(5, "zed")).await.unwrap();

    assert!(!changed);
    assert_eq!(subjects(&fx.wiki, "master"), vec!["seed"]);
}

#[tokio::test]
async fn test_add_wiki_entry_once() {
    let Some(fx) = fixture(NEXT_YML).await else {
        return;
    };
    let url = "https://github.com/erin/dotfiles/blob/master/.vimrc";

    assert!(fx.store.add_wiki_entry("bob", "erin", url, Some("short")).await.unwrap());
    assert!(!fx.store.add_wiki_entry("dave", "erin", url, None).await.unwrap());

    let page = fx.wiki_file("Request.md");
    assert_eq!(page.matches("erin |").count(), 1);
    assert!(page.contains(&format!("erin | 3 | bob | short | [リンク]({})\n...", url)));
    assert_eq!(subjects(&fx.wiki, "master"), vec!["Add erin", "seed"]);
    assert_eq!(fx.source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_next_without_parameters_touches_nothing() {
    let Some(fx) = fixture(NEXT_YML).await else {
        return;
    };
    let tokens = vec!["please".to_string()];

    let err = fx.store.next(&tokens, &result(5, "alice")).await.unwrap_err();

    assert!(matches!(err, RepoError::MissingParameter));
    assert_eq!(fx.site_file("_data/next.yml"), NEXT_YML);
    assert_eq!(subjects(&fx.site, "gh-pages"), vec!["seed"]);
}

#[tokio::test]
async fn test_next_continuation_advances_week() {
    let Some(fx) = fixture(NEXT_YML).await else {
        return;
    };

    let next = fx.store.next(&["後編"], &result(5, "alice")).await.unwrap();

    assert_eq!(next.id, 6);
    assert_eq!(next.date, "2024-01-08 23:00");
    assert_eq!(next.vimrcs[0].url, "https://github.com/alice/dots/blob/master/vimrc");
    assert_eq!(fx.store.read_next_yaml().await.unwrap(), next);
    assert_eq!(
        subjects(&fx.site, "gh-pages")[0],
        "Update the next information: #6 alice"
    );
}

#[tokio::test]
async fn test_next_with_urls_replaces_author() {
    let Some(fx) = fixture(NEXT_YML).await else {
        return;
    };
    let tokens = [
        "https://github.com/bob/vim/blob/master/init.vim",
        "https://github.com/bob/vim/blob/master/plugins.toml",
        "前編",
    ];

    let next = fx.store.next(&tokens, &result(5, "alice")).await.unwrap();

    assert_eq!(next.author.name, "bob");
    assert_eq!(next.vimrcs.len(), 2);
    assert_eq!(next.vimrcs[1].name, "plugins.toml");
    assert!(fx.site_file("_data/next.yml").contains("前編"));
}

#[tokio::test]
async fn test_concurrent_next_updates_are_serialized() {
    let Some(fx) = fixture(NEXT_YML).await else {
        return;
    };
    let archived = result(5, "alice");

    let (first, second) = tokio::join!(
        fx.store.next(&["https://github.com/bob/vim/blob/master/vimrc"], &archived),
        fx.store.next(&["https://github.com/erin/dots/blob/master/.vimrc"], &archived),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    let mut ids = vec![first.id, second.id];
    ids.sort();
    assert_eq!(ids, vec![6, 7]);

    let last = if first.id == 7 { first } else { second };
    assert_eq!(fx.store.read_next_yaml().await.unwrap(), last);

    let log = subjects(&fx.site, "gh-pages");
    assert_eq!(log.len(), 3);
    assert!(log[..2]
        .iter()
        .all(|subject| subject.starts_with("Update the next information")));
}
