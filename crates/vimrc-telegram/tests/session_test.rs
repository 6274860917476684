//! Whole sessions against local bare site and wiki repositories.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use vimrc_core::{BotConfig, RemoteSource};
use vimrc_git::{CommitIdentity, GitRepository};
use vimrc_models::{ChatMessage, NextVimrc};
use vimrc_repos::archive::{parse_archives, parse_next};
use vimrc_repos::ContentStore;
use vimrc_telegram::{BotState, ChatCommand};

const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

const LOG_URL: &str = "https://t.me/c/1/100";

const NEXT_YML: &str = "- id: 5\n  date: 2024-01-01 23:00\n  author:\n    name: alice\n    url: https://github.com/alice\n  vimrcs:\n  - url: https://github.com/alice/dots/blob/master/vimrc\n    name: vimrc\n    hash: null\n  part: null\n";

const ARCHIVES_YML: &str = "- id: 4\n  date: 2023-12-25 23:00\n  author:\n    name: carol\n    url: https://github.com/carol\n  vimrcs: []\n  part: null\n  members:\n  - dave\n";

const REQUEST_MD: &str = "# Request\n\nauthor | lines | requester | comment | link\n--- | --- | --- | --- | ---\nalice | 10 | bob | | [リンク](https://github.com/alice/dots/blob/master/vimrc)\n...\n";

/// Every file has the same body and every repository the same head.
struct FakeSource;

#[async_trait]
impl RemoteSource for FakeSource {
    async fn fetch_text(&self, _url: &str) -> vimrc_core::Result<String> {
        Ok("set number\nset hidden\nsyntax on".to_string())
    }

    async fn latest_commit(&self, _url: &str) -> vimrc_core::Result<String> {
        Ok(HASH.to_string())
    }
}

fn git(dir: &Path, args: &[&str]) {
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
}

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

/// Bot state with an installed store, or `None` without git.
async fn session_state() -> Option<(TempDir, BotState)> {
    if !GitRepository::is_available() {
        return None;
    }
    let root = tempfile::tempdir().unwrap();
    let site = seed_remote(
        root.path(),
        "site",
        "gh-pages",
        &[("_data/next.yml", NEXT_YML), ("_data/archives.yml", ARCHIVES_YML)],
    );
    let wiki = seed_remote(root.path(), "wiki", "master", &[("Request.md", REQUEST_MD)]);

    // An existing key keeps setup away from ssh-keygen and the GitHub API.
    let key_dir = root.path().join("work/.ssh");
    fs::create_dir_all(&key_dir).unwrap();
    fs::write(key_dir.join("bot_deploy_rsa"), "key").unwrap();

    let source: Arc<dyn RemoteSource> = Arc::new(FakeSource);
    let mut store = ContentStore::new(
        "vim-jp/reading-vimrc",
        root.path().join("work"),
        "token",
        source.clone(),
    )
    .with_remote_urls(site.to_string_lossy(), wiki.to_string_lossy())
    .with_identity(CommitIdentity::new("Bot", "bot@example.com"));
    store.setup().await.unwrap();

    let config = BotConfig::from_lookup(|key| match key {
        "READING_VIMRC_ADMIN_USERS" => Some("admin".to_string()),
        _ => None,
    })
    .unwrap();
    let state = BotState::new(config, source);
    state.install_store(store).await;
    Some((root, state))
}

async fn run(state: &BotState, text: &str) -> Vec<String> {
    let command = ChatCommand::parse(text).unwrap();
    state.execute(command, "admin", LOG_URL).await.unwrap()
}

fn site_next(root: &TempDir) -> NextVimrc {
    let text = fs::read_to_string(root.path().join("work/gh-pages/_data/next.yml")).unwrap();
    parse_next(&text).unwrap().unwrap()
}

#[tokio::test]
async fn test_session_is_archived_on_stop() {
    let Some((root, state)) = session_state().await else {
        return;
    };

    let replies = run(&state, "!reading_vimrc start").await;
    assert!(replies[0].starts_with("=== 第5回 vimrc読書会 ==="));
    state.record_message(ChatMessage::new("carol", "L1")).await;
    assert!(state.quote("L1", "carol").await.is_some());

    let replies = run(&state, "!reading_vimrc stop").await;
    assert_eq!(replies.len(), 2);
    assert!(replies[0].starts_with("おつかれさまでした。次回読む vimrc を決めましょう！"));
    assert!(replies[1].starts_with("アーカイブページを更新しました"));
    assert!(state.quote("L1", "carol").await.is_none());

    let archives = fs::read_to_string(root.path().join("work/gh-pages/_data/archives.yml")).unwrap();
    let records = parse_archives(&archives).unwrap();
    let archived = records.last().unwrap();
    assert_eq!(archived.id, 5);
    assert_eq!(archived.members, vec!["carol"]);
    assert_eq!(archived.log.as_deref(), Some(LOG_URL));
    assert_eq!(
        archived.vimrcs[0].url,
        format!("https://github.com/alice/dots/blob/{}/vimrc", HASH)
    );
}

#[tokio::test]
async fn test_continuation_while_running_uses_current_session() {
    let Some((root, state)) = session_state().await else {
        return;
    };

    run(&state, "!reading_vimrc start").await;
    run(&state, "!reading_vimrc stop").await;
    let replies = run(&state, "!reading_vimrc next https://github.com/bob/vim/blob/master/vimrc").await;
    assert!(replies[0].contains("第6回"));

    let replies = run(&state, "!reading_vimrc start").await;
    assert!(replies[0].starts_with("=== 第6回 vimrc読書会 ==="));
    assert_eq!(run(&state, "!reading_vimrc status").await, vec!["started"]);

    run(&state, "!reading_vimrc next 後編").await;

    let next = site_next(&root);
    assert_eq!(next.id, 7);
    assert_eq!(next.author.name, "bob");
    assert_eq!(
        next.vimrcs[0].url,
        format!("https://github.com/bob/vim/blob/{}/vimrc", HASH)
    );
    assert_eq!(next.part.map(|p| p.to_string()).as_deref(), Some("後編"));
}
