//! Line references typed in chat.
//!
//! A message starting with `L10`, `L10-L20`, `L10+3` or `vimrc#L10 L20,30`
//! asks the bot to quote those lines of a loaded file. Quoted lines that
//! install plugins are linked to the plugin repositories.

use std::sync::LazyLock;

use regex::Regex;

use crate::progressor::Progressor;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\S+)#)??(L\d+(?:[-+]L?\d+)?(?:(?:\s+L|,L?)\d+(?:[-+]L?\d+)?)*)")
        .expect("Invalid reference regex")
});

static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"L?(\d+)(?:([-+])L?(\d+))?").expect("Invalid range regex"));

static PLUGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(?:"\s*)?(?:Plug(?:in)?|NeoBundle\w*|call\s+(?:dein|minpac)#add\()\s*['"]([^'"]+)"#,
    )
    .expect("Invalid plugin regex")
});

/// A 1-indexed inclusive line range as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    /// `None` for a single line.
    pub end: Option<usize>,
    /// The text the range was parsed from.
    pub token: String,
}

impl LineRange {
    /// Parse `L10`, `10`, `L10-L20`, `L10-20` or `L10+5`.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = RANGE.captures(token)?;
        let start: usize = caps[1].parse().unwrap_or(0);
        let end = match (caps.get(2).map(|m| m.as_str()), caps.get(3)) {
            (Some("+"), Some(n)) => Some(start.saturating_add(n.as_str().parse().unwrap_or(0))),
            (Some(_), Some(n)) => Some(n.as_str().parse().unwrap_or(0)),
            _ => None,
        };
        Some(Self {
            start,
            end,
            token: caps[0].to_string(),
        })
    }

    /// GitHub line anchor, e.g. `#L3` or `#L3-L5`.
    pub fn fragment(&self) -> String {
        fragment(self.start, self.end.unwrap_or(self.start))
    }
}

fn fragment(start: usize, end: usize) -> String {
    if end > start {
        format!("#L{}-L{}", start, end)
    } else {
        format!("#L{}", start)
    }
}

/// A parsed line reference message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRequest {
    /// File name pattern before `#`, if any.
    pub file: Option<String>,
    pub ranges: Vec<LineRange>,
}

/// Parse a chat message as a line reference.
pub fn parse_reference(text: &str) -> Option<ReferenceRequest> {
    let caps = REFERENCE.captures(text)?;
    let ranges: Vec<LineRange> = RANGE
        .find_iter(&caps[2])
        .filter_map(|m| LineRange::parse(m.as_str()))
        .collect();
    if ranges.is_empty() {
        return None;
    }
    Some(ReferenceRequest {
        file: caps.get(1).map(|m| m.as_str().to_string()),
        ranges,
    })
}

/// A plugin installed by quoted lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLink {
    /// Repository as written, with bare names expanded to `vim-scripts/<name>`.
    pub repo: String,
    pub url: String,
}

impl PluginLink {
    fn from_declared(declared: &str) -> Self {
        let repo = if declared.contains('/') {
            declared.to_string()
        } else {
            format!("vim-scripts/{}", declared)
        };
        let url = if !repo.contains(':') && repo.matches('/').count() == 1 {
            format!("https://github.com/{}", repo)
        } else {
            repo.clone()
        };
        Self { repo, url }
    }
}

/// Plugins declared by `Plug`, `NeoBundle*`, `dein#add` or `minpac#add` lines.
pub fn extract_plugin_urls(lines: &[String]) -> Vec<PluginLink> {
    let text = lines.join("\n");
    PLUGIN
        .captures_iter(&text)
        .map(|caps| PluginLink::from_declared(&caps[1]))
        .collect()
}

/// Quoted lines of one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// Anchor covering the lines actually returned.
    pub fragment: String,
    pub first_line: usize,
    pub lines: Vec<String>,
    pub plugins: Vec<PluginLink>,
}

impl Excerpt {
    /// Numbered lines, `%4d | text`.
    pub fn numbered(&self) -> Vec<String> {
        self.lines
            .iter()
            .enumerate()
            .map(|(n, line)| format!("{:4} | {}", self.first_line + n, line))
            .collect()
    }
}

/// Outcome of one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quote {
    Excerpt(Excerpt),
    /// The range selects no line of the file.
    InvalidRange(String),
}

/// Every quote of a request against one resolved file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedFile {
    /// Canonical URL of the file.
    pub key: String,
    /// Last path segment of the key.
    pub name: String,
    pub quotes: Vec<Quote>,
}

/// Resolve `request` for `user` against the loaded files.
///
/// `None` when no file matches.
pub fn resolve(progressor: &mut Progressor, request: &ReferenceRequest, user: &str) -> Option<QuotedFile> {
    let (key, content) = progressor.get_vimrc_file(request.file.as_deref(), user)?;

    let quotes = request
        .ranges
        .iter()
        .map(|range| {
            let lines = Progressor::get_vimrc_lines(content, range.start, range.end);
            if lines.is_empty() {
                return Quote::InvalidRange(range.token.clone());
            }
            Quote::Excerpt(Excerpt {
                fragment: fragment(range.start, range.start + lines.len() - 1),
                first_line: range.start,
                plugins: extract_plugin_urls(lines),
                lines: lines.to_vec(),
            })
        })
        .collect();

    let name = key.rsplit('/').next().unwrap_or(key.as_str()).to_string();
    Some(QuotedFile { key, name, quotes })
}
