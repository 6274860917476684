//! The request queue page of the wiki.
//!
//! `Request.md` holds one table row per requested author. New rows go right
//! above the first line starting with `...`.

/// File name of the request page in the wiki repository.
pub const REQUEST_FILE: &str = "Request.md";

const SENTINEL: &str = "...";

/// Format one request row.
pub fn request_line(author: &str, lines: usize, requester: &str, url: &str, comment: Option<&str>) -> String {
    format!(
        "{} | {} | {} | {} | [リンク]({})",
        author,
        lines,
        requester,
        comment.unwrap_or_default(),
        url
    )
}

/// Lines of the request page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFile {
    lines: Vec<String>,
}

impl RequestFile {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether a row for `author` exists.
    pub fn has_author(&self, author: &str) -> bool {
        let prefix = format!("{} ", author);
        self.lines.iter().any(|line| line.starts_with(&prefix))
    }

    /// Insert `row` above the sentinel unless `author` already has a row.
    ///
    /// Returns whether the page changed.
    pub fn add(&mut self, author: &str, row: String) -> bool {
        if self.has_author(author) {
            return false;
        }
        let Some(index) = self.lines.iter().position(|line| line.starts_with(SENTINEL)) else {
            return false;
        };
        self.lines.insert(index, row);
        true
    }

    /// Drop every row of `author`. Returns whether the page changed.
    pub fn remove(&mut self, author: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| !is_row_of(line, author));
        self.lines.len() != before
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// `<author>`, optional whitespace, then `|`.
fn is_row_of(line: &str, author: &str) -> bool {
    line.strip_prefix(author)
        .is_some_and(|rest| rest.trim_start().starts_with('|'))
}
