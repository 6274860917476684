//! Schedule and archive records for reading vimrc sessions.
//!
//! These mirror the YAML documents kept in the site repository, so field
//! names and the `null` encoding of absent values must stay stable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A source file read in a session.
///
/// `url` is the canonical identifier of the file. Once a session starts,
/// both `url` and `raw_url` point at a fixed commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VimrcFile {
    /// Web URL of the file (the canonical key).
    pub url: String,

    /// URL of the raw file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_url: Option<String>,

    /// File name shown to participants.
    pub name: String,

    /// Commit hash the file is pinned to, if known.
    #[serde(default)]
    pub hash: Option<String>,
}

impl VimrcFile {
    /// Creates an unpinned file entry.
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw_url: None,
            name: name.into(),
            hash: None,
        }
    }

    /// Sets the pinned commit hash.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

/// The owner of the files read in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub url: String,
}

impl Author {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Part of a session split across several weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Part {
    /// First part.
    #[serde(rename = "前編")]
    First,
    /// Middle part.
    #[serde(rename = "中編")]
    Middle,
    /// Last part.
    #[serde(rename = "後編")]
    Last,
}

impl Part {
    /// The label used in records and chat.
    pub fn as_str(&self) -> &'static str {
        match self {
            Part::First => "前編",
            Part::Middle => "中編",
            Part::Last => "後編",
        }
    }

    /// Whether the session continues next week.
    pub fn continues(&self) -> bool {
        !matches!(self, Part::Last)
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token is not a part label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePartError(pub String);

impl fmt::Display for ParsePartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown part: {}", self.0)
    }
}

impl std::error::Error for ParsePartError {}

impl FromStr for Part {
    type Err = ParsePartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "前編" => Ok(Part::First),
            "中編" => Ok(Part::Middle),
            "後編" => Ok(Part::Last),
            other => Err(ParsePartError(other.to_string())),
        }
    }
}

/// The single upcoming session (`_data/next.yml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextVimrc {
    /// Session number.
    pub id: u32,

    /// Scheduled start, `YYYY-MM-DD HH:MM` in the schedule time zone.
    pub date: String,

    pub author: Author,

    #[serde(default)]
    pub vimrcs: Vec<VimrcFile>,

    #[serde(default)]
    pub part: Option<Part>,

    /// Free-form note shown on the site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

/// A finished session (one entry of `_data/archives.yml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveVimrc {
    pub id: u32,

    pub date: String,

    pub author: Author,

    #[serde(default)]
    pub vimrcs: Vec<VimrcFile>,

    #[serde(default)]
    pub part: Option<Part>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,

    /// Participants, sorted.
    #[serde(default)]
    pub members: Vec<String>,

    /// Link to the chat log of the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl From<NextVimrc> for ArchiveVimrc {
    fn from(next: NextVimrc) -> Self {
        Self {
            id: next.id,
            date: next.date,
            author: next.author,
            vimrcs: next.vimrcs,
            part: next.part,
            other: next.other,
            members: Vec::new(),
            log: None,
        }
    }
}
