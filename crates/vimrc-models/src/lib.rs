//! Core data models for the reading vimrc bot.
//!
//! This crate provides the records stored in the site repository
//! (`_data/next.yml`, `_data/archives.yml`) and the chat message envelope
//! consumed by the session progressor.

pub mod message;
pub mod vimrc;

pub use message::ChatMessage;
pub use vimrc::{ArchiveVimrc, Author, NextVimrc, Part, ParsePartError, VimrcFile};
