use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Insert spaces between CJK and Latin characters
    Space {
        /// Subtitle file to rewrite in place
        file: PathBuf,
    },

    /// Remove list numbering and trailing punctuation from text lines
    Clean {
        /// Subtitle file to rewrite in place
        file: PathBuf,
    },

    /// Check subtitle files for format errors
    Validate {
        /// Files to check (default: the change list, else every .srt below the current directory)
        paths: Vec<PathBuf>,

        /// Report every problem instead of stopping at the first one per file
        #[arg(long)]
        all_errors: bool,
    },

    /// Move overlapping cue starts just past the previous cue's end
    FixOverlap {
        /// Subtitle file to rewrite in place
        file: PathBuf,

        /// Refuse to write if the result still fails validation
        #[arg(long)]
        strict: bool,
    },

    /// Renumber blocks from 1
    Reindex {
        /// A single .srt file or a directory to walk
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Shift timestamps of every block from an index onwards
    #[command(allow_negative_numbers = true)]
    Shift {
        /// Subtitle file to rewrite in place
        file: PathBuf,

        /// First block index to shift
        start_index: u32,

        /// Seconds to add (negative to move earlier)
        delta_seconds: f64,

        /// Refuse to write if the result fails validation
        #[arg(long)]
        strict: bool,
    },

    /// Download session videos listed in a manifest
    Download {
        /// Manifest of alternating folder-name and URL lines
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// Translate subtitles using a chat completions API
    Translate {
        /// Input subtitle file
        input: PathBuf,

        /// Output file (default: <input-stem>.<suffix>.srt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the effective configuration to a file
    InitConfig {
        /// Destination
        #[arg(short, long, default_value = "srtkit.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
