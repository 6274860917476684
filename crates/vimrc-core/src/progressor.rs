//! In-memory state of the running reading session.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use vimrc_models::{ChatMessage, Part, VimrcFile};

/// Whether a session is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    Started,
    #[default]
    Stopped,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Started => f.write_str("started"),
            SessionStatus::Stopped => f.write_str("stopped"),
        }
    }
}

/// Live message log plus a single undo slot.
///
/// Only one level of undo exists: a second `reset` overwrites the slot.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    active: Vec<ChatMessage>,
    previous: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn push(&mut self, message: ChatMessage) {
        self.active.push(message);
    }

    /// Move the live log into the undo slot and start an empty one.
    pub fn reset(&mut self) {
        self.previous = std::mem::take(&mut self.active);
    }

    /// Exchange the live log and the undo slot.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.active, &mut self.previous);
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.active
    }
}

/// Strategies for resolving a typed file name to a loaded file, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatcher {
    /// The whole key.
    Exact,
    /// The trailing path segments, e.g. `vimrc` or `dot.vim/vimrc`.
    PathSuffix,
    /// A path segment followed by an extension, e.g. `init` for `init.vim`.
    WithExtension,
    /// Anywhere in the key.
    Substring,
}

impl NameMatcher {
    pub const ORDER: [NameMatcher; 4] = [
        NameMatcher::Exact,
        NameMatcher::PathSuffix,
        NameMatcher::WithExtension,
        NameMatcher::Substring,
    ];

    /// Case-insensitive literal match of `pattern` against `key`.
    pub fn matches(&self, key: &str, pattern: &str) -> bool {
        let key = key.to_lowercase();
        let pattern = pattern.to_lowercase();
        match self {
            NameMatcher::Exact => key == pattern,
            NameMatcher::PathSuffix => key.ends_with(&format!("/{}", pattern)),
            NameMatcher::WithExtension => {
                let needle = format!("/{}", pattern);
                key.match_indices(&needle).any(|(at, _)| {
                    let rest = &key[at + needle.len()..];
                    rest.is_empty() || rest.starts_with('.')
                })
            }
            NameMatcher::Substring => key.contains(&pattern),
        }
    }
}

/// Tracks one reading session: participants, files and per-user context.
#[derive(Debug, Default)]
pub struct Progressor {
    id: u32,
    log_url: String,
    part: Option<Part>,
    status: SessionStatus,
    log: MessageLog,
    vimrcs: Vec<VimrcFile>,
    /// Loaded file contents by canonical key, in load order.
    contents: Vec<(String, Vec<String>)>,
    last_file_by_user: HashMap<String, String>,
}

impl Progressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn log_url(&self) -> &str {
        &self.log_url
    }

    pub fn part(&self) -> Option<Part> {
        self.part
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Started
    }

    pub fn vimrcs(&self) -> &[VimrcFile] {
        &self.vimrcs
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.log.messages()
    }

    /// Begin session `id`. Clears the message log and every loaded file.
    pub fn start(&mut self, id: u32, log_url: impl Into<String>, vimrcs: Vec<VimrcFile>, part: Option<Part>) {
        self.id = id;
        self.log_url = log_url.into();
        self.vimrcs = vimrcs;
        self.part = part;
        self.log.clear();
        self.status = SessionStatus::Started;
        self.clear_vimrcs();
    }

    /// End the session. Messages and files are kept for tallying.
    pub fn stop(&mut self) {
        self.status = SessionStatus::Stopped;
    }

    /// Record a message. Ignored unless a session is running.
    pub fn add_message(&mut self, message: ChatMessage) {
        if !self.is_running() {
            return;
        }
        self.log.push(message);
    }

    pub fn reset(&mut self) {
        self.log.reset();
    }

    /// Undo the last `reset`.
    pub fn restore(&mut self) {
        self.log.swap();
    }

    /// Distinct participants, sorted.
    pub fn members(&self) -> Vec<String> {
        self.messages()
            .iter()
            .map(|m| m.user.as_str())
            .filter(|u| !u.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Participants with their message counts, sorted by name.
    pub fn members_with_count(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for message in self.messages().iter().filter(|m| !m.user.is_empty()) {
            *counts.entry(message.user.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(user, count)| (user.to_string(), count))
            .collect()
    }

    /// Store the content of a file under `key`, split into lines.
    pub fn set_vimrc_content(&mut self, key: impl Into<String>, text: &str) {
        let key = key.into();
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        match self.contents.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = lines,
            None => self.contents.push((key, lines)),
        }
    }

    /// Resolve a file for `user`.
    ///
    /// With a pattern, the first matcher strategy matching any key wins.
    /// Without one, the user's last file is used, else the first loaded
    /// file. The result is remembered for the user.
    pub fn get_vimrc_file(&mut self, pattern: Option<&str>, user: &str) -> Option<(String, &[String])> {
        let key = match pattern.filter(|p| !p.is_empty()) {
            Some(pattern) => self.find_key(pattern),
            None => self
                .last_file_by_user
                .get(user)
                .cloned()
                .or_else(|| self.contents.first().map(|(k, _)| k.clone())),
        }?;

        let index = self.contents.iter().position(|(k, _)| *k == key)?;
        if !user.is_empty() {
            self.last_file_by_user.insert(user.to_string(), key.clone());
        }
        Some((key, self.contents[index].1.as_slice()))
    }

    fn find_key(&self, pattern: &str) -> Option<String> {
        NameMatcher::ORDER.iter().find_map(|matcher| {
            self.contents
                .iter()
                .map(|(k, _)| k)
                .find(|k| matcher.matches(k, pattern))
                .cloned()
        })
    }

    /// Lines `start..=end` (1-indexed) of `content`.
    ///
    /// `end` defaults to `start` and is clamped to the last line. Empty when
    /// `start` is 0, past the end, or after `end`.
    pub fn get_vimrc_lines(content: &[String], start: usize, end: Option<usize>) -> &[String] {
        let end = end.unwrap_or(start).min(content.len());
        if start == 0 || start > end {
            return &[];
        }
        &content[start - 1..end]
    }

    /// Forget loaded contents and per-user file memory.
    pub fn clear_vimrcs(&mut self) {
        self.contents.clear();
        self.last_file_by_user.clear();
    }
}
