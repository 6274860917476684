//! Integration tests driving git against local bare repositories.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use vimrc_git::{CommitIdentity, GitError, GitRepository, SetupOutcome};

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

/// Create a bare remote whose `branch` holds `files`.
fn seed_remote(root: &Path, branch: &str, files: &[(&str, &str)]) -> PathBuf {
    let seed = root.join("seed");
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

    let remote = root.join("remote.git");
    git(
        root,
        &["clone", "-q", "--bare", seed.to_str().unwrap(), remote.to_str().unwrap()],
    );
    remote
}

fn repository(remote: &Path, work_dir: &Path, branch: &str) -> GitRepository {
    GitRepository::new(
        remote.to_string_lossy(),
        work_dir,
        "/nonexistent/key",
        Some(branch),
    )
    .unwrap()
    .with_identity(CommitIdentity::new("Bot", "bot@example.com"))
}

#[tokio::test]
async fn test_setup_clones_then_updates() {
    if !GitRepository::is_available() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let remote = seed_remote(root.path(), "gh-pages", &[("index.md", "hello\n")]);
    let repo = repository(&remote, &root.path().join("work"), "gh-pages");

    assert_eq!(repo.setup().await.unwrap(), SetupOutcome::Created);
    assert_eq!(
        fs::read_to_string(repo.work_dir().join("index.md")).unwrap(),
        "hello\n"
    );

    assert_eq!(repo.setup().await.unwrap(), SetupOutcome::Updated);
}

#[tokio::test]
async fn test_commit_and_push_reaches_remote() {
    if !GitRepository::is_available() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let remote = seed_remote(root.path(), "gh-pages", &[("index.md", "hello\n")]);
    let repo = repository(&remote, &root.path().join("work"), "gh-pages");
    repo.setup().await.unwrap();

    fs::write(repo.work_dir().join("next.yml"), "- id: 1\n").unwrap();
    let message = repo.commit_and_push("Add next").await.unwrap();
    assert_eq!(message, "Add next");

    let log = git(&remote, &["log", "--format=%s|%an", "gh-pages"]);
    assert_eq!(log.lines().next(), Some("Add next|Bot"));
}

#[tokio::test]
async fn test_update_discards_local_changes() {
    if !GitRepository::is_available() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let remote = seed_remote(root.path(), "master", &[("Request.md", "...\n")]);
    let first = repository(&remote, &root.path().join("first"), "master");
    let second = repository(&remote, &root.path().join("second"), "master");
    first.setup().await.unwrap();
    second.setup().await.unwrap();

    fs::write(first.work_dir().join("Request.md"), "alice | 1\n...\n").unwrap();
    first.commit_and_push("Add alice").await.unwrap();

    fs::write(second.work_dir().join("Request.md"), "stale\n").unwrap();
    second.update_to_latest().await.unwrap();
    assert_eq!(
        fs::read_to_string(second.work_dir().join("Request.md")).unwrap(),
        "alice | 1\n...\n"
    );
}

#[tokio::test]
async fn test_commit_without_changes_fails() {
    if !GitRepository::is_available() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let remote = seed_remote(root.path(), "master", &[("Request.md", "...\n")]);
    let repo = repository(&remote, &root.path().join("work"), "master");
    repo.setup().await.unwrap();

    let err = repo.commit_and_push("nothing").await.unwrap_err();
    assert!(matches!(
        err,
        GitError::CommandFailed { ref args, .. } if args[0] == "commit"
    ));
}
