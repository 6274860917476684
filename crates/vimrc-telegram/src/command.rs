//! `!reading_vimrc <command>` parsing.

use std::sync::LazyLock;

use regex::Regex;

/// Prefix of every bot command.
pub const COMMAND_PREFIX: &str = "!reading_vimrc";

static COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^!reading_vimrc(?:\s+(\S+)(?:\s+(.*))?)?$").expect("Invalid command regex")
});

/// Commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Stop,
    Reset,
    Restore,
    Status,
    Members,
    MembersWithCount,
    /// File URLs and an optional part label.
    Next(Vec<String>),
    /// Queue a file on the request page. `force` skips the already-read check.
    Request {
        force: bool,
        url: String,
        comment: Option<String>,
    },
    Help,
    Unknown(String),
}

impl ChatCommand {
    /// Whether `text` is addressed to the bot at all.
    pub fn is_command(text: &str) -> bool {
        text.starts_with(COMMAND_PREFIX)
    }

    /// Parse a command message. `None` when `text` is not one.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = COMMAND.captures(text.trim())?;
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or("help");
        let args = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

        let command = match name {
            "start" | "start_reading_vimrc" => ChatCommand::Start,
            "stop" => ChatCommand::Stop,
            "reset" => ChatCommand::Reset,
            "restore" => ChatCommand::Restore,
            "status" => ChatCommand::Status,
            "member" | "members" => ChatCommand::Members,
            "member_with_count" | "members_with_count" => ChatCommand::MembersWithCount,
            "next" => ChatCommand::Next(args.split_whitespace().map(str::to_string).collect()),
            "request" | "request!" => {
                let (url, comment) = match args.split_once(char::is_whitespace) {
                    Some((url, comment)) => (url, Some(comment.trim().to_string())),
                    None => (args, None),
                };
                ChatCommand::Request {
                    force: name.ends_with('!'),
                    url: url.to_string(),
                    comment: comment.filter(|c| !c.is_empty()),
                }
            }
            "help" => ChatCommand::Help,
            other => ChatCommand::Unknown(other.to_string()),
        };
        Some(command)
    }

    /// Commands only admin users may run.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            ChatCommand::Start
                | ChatCommand::Stop
                | ChatCommand::Reset
                | ChatCommand::Restore
                | ChatCommand::Next(_)
        )
    }
}
