//! File operations inside the working copies.
//!
//! Whole-file rewrites go through a temporary file in the same directory and
//! a rename, so a crash never leaves a half written YAML document for the
//! next commit to pick up.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{RepoError, Result};

/// Write `data` to `path` through a temporary file and a rename.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let write_error = |source| RepoError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or(Path::new("."));
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(write_error)?;
    }

    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    temp_file.write_all(data).map_err(write_error)?;
    temp_file.flush().map_err(write_error)?;
    temp_file.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

/// [`atomic_write`] on the blocking pool.
pub async fn write_file(path: PathBuf, data: String) -> Result<()> {
    let target = path.clone();
    tokio::task::spawn_blocking(move || atomic_write(&target, data.as_bytes()))
        .await
        .map_err(|e| RepoError::WriteError {
            path,
            source: std::io::Error::other(e),
        })?
}

/// Append `data` to `path`, creating it if missing. Prior bytes are untouched.
pub async fn append_file(path: &Path, data: &str) -> Result<()> {
    let write_error = |source| RepoError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(write_error)?;
    file.write_all(data.as_bytes()).await.map_err(write_error)?;
    file.flush().await.map_err(write_error)?;
    Ok(())
}

/// Read `path` as UTF-8 text.
pub async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RepoError::ReadError {
            path: path.to_path_buf(),
            source,
        })
}
