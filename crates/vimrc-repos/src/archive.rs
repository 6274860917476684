//! Site files: schedule, archive list and archive pages.

use std::path::PathBuf;

use vimrc_models::{ArchiveVimrc, NextVimrc};

use crate::error::Result;

/// Upcoming session, a one-element list.
pub const NEXT_YAML: &str = "_data/next.yml";

/// Every finished session, append-only.
pub const ARCHIVES_YAML: &str = "_data/archives.yml";

/// Relative path of the archive page of session `id`.
pub fn archive_page_path(id: u32) -> PathBuf {
    PathBuf::from("archive").join(format!("{:03}.md", id))
}

/// Jekyll page of session `id`.
pub fn archive_page(id: u32) -> String {
    format!(
        "---\nlayout: archive\ntitle: 第{id}回 vimrc読書会\nid: {id}\ncategory: archive\n---\n{{% include archive.md %}}\n"
    )
}

/// YAML list item for `record`, ready to append to the archive list.
pub fn archive_entry(record: &ArchiveVimrc) -> Result<String> {
    Ok(serde_yaml::to_string(&[record])?)
}

/// YAML of the schedule file holding `record`.
pub fn next_document(record: &NextVimrc) -> Result<String> {
    Ok(serde_yaml::to_string(&[record])?)
}

/// First record of the schedule file, if any.
pub fn parse_next(text: &str) -> Result<Option<NextVimrc>> {
    let records: Vec<NextVimrc> = serde_yaml::from_str(text)?;
    Ok(records.into_iter().next())
}

pub fn parse_archives(text: &str) -> Result<Vec<ArchiveVimrc>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_str(text)?)
}
