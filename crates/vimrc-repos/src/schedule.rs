//! Computing the next session record.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use vimrc_models::{ArchiveVimrc, Author, NextVimrc, Part, VimrcFile};

use crate::error::{RepoError, Result};

/// Format of `date` in the schedule.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Sessions start at 23:00.
const SESSION_TIME: &str = "23:00";

/// The arguments of `next`, split into file URLs and a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextRequest {
    pub urls: Vec<String>,
    pub part: Option<Part>,
}

impl NextRequest {
    /// Split `tokens` into URLs and the first part label.
    ///
    /// # Errors
    ///
    /// `RepoError::MissingParameter` when there is neither a URL nor a part.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let (urls, others): (Vec<&str>, Vec<&str>) = tokens
            .iter()
            .map(|token| token.as_ref())
            .partition(|token| token.starts_with("http"));
        let part = others.iter().find_map(|token| token.parse::<Part>().ok());

        if urls.is_empty() && part.is_none() {
            return Err(RepoError::MissingParameter);
        }
        Ok(Self {
            urls: urls.into_iter().map(str::to_string).collect(),
            part,
        })
    }

    /// No URLs: the finished session's files are read again.
    pub fn is_continuation(&self) -> bool {
        self.urls.is_empty()
    }
}

/// What a file URL says about the file and its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlInfo {
    pub vimrc: VimrcFile,
    pub author: Author,
}

/// Split a `https://github.com/<owner>/<repo>/blob/<ref>/<path>` URL.
///
/// The ref becomes the hash only when it is a full 40 character commit id.
pub fn github_url_info(url: &str) -> UrlInfo {
    let segments: Vec<&str> = url.split('/').collect();
    let hash = segments
        .get(6)
        .filter(|s| s.len() == 40 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')))
        .map(|s| s.to_string());
    let name = segments.last().copied().unwrap_or_default();

    UrlInfo {
        vimrc: VimrcFile {
            url: url.to_string(),
            raw_url: None,
            name: name.to_string(),
            hash,
        },
        author: Author::new(
            segments.get(3).copied().unwrap_or_default(),
            segments[..segments.len().min(4)].join("/"),
        ),
    }
}

/// Parse a schedule date in `offset`.
///
/// Accepts `YYYY-MM-DD HH:MM`, with optional seconds, or a bare date.
pub fn parse_date(date: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let date = date.trim();
    let naive = NaiveDateTime::parse_from_str(date, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|_| RepoError::InvalidDate(date.to_string()))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| RepoError::InvalidDate(date.to_string()))
}

/// The day one week after `date`, at 23:00.
pub fn next_week(date: &str) -> Result<String> {
    let day = date
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| RepoError::InvalidDate(date.to_string()))?;
    let next = day + Duration::days(7);
    Ok(format!("{} {}", next.format("%Y-%m-%d"), SESSION_TIME))
}

/// Build the next record from the current one.
///
/// When the scheduled date has passed, the id and date move forward by one
/// session. Author and files come from the request URLs, or from `result`
/// on a continuation.
pub fn compute_next(
    mut current: NextVimrc,
    request: &NextRequest,
    result: &ArchiveVimrc,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<NextVimrc> {
    let urls: Vec<&str> = if request.is_continuation() {
        result.vimrcs.iter().map(|v| v.url.as_str()).collect()
    } else {
        request.urls.iter().map(String::as_str).collect()
    };
    let infos: Vec<UrlInfo> = urls.into_iter().map(github_url_info).collect();
    let Some(first) = infos.first() else {
        return Err(RepoError::MissingParameter);
    };

    let scheduled = parse_date(&current.date, offset)?;
    if scheduled < now {
        current.id += 1;
        current.date = next_week(&current.date)?;
    }

    current.author = first.author.clone();
    current.vimrcs = infos.into_iter().map(|info| info.vimrc).collect();
    current.part = request.part;
    Ok(current)
}
