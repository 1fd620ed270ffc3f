//! srtkit - SRT subtitle toolkit
//!
//! Parsing, validation, normalization and timing repair for SubRip files,
//! plus batch translation through a chat API and session video downloads
//! through yt-dlp.

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod files;
pub mod subtitle;
pub mod translate;
pub mod workflow;
