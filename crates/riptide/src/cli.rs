//! Clap derive structures for the `riptide` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use riptide_core::{QueueDirection, StatusCategory};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// riptide -- headless client for Transmission daemons
#[derive(Debug, Parser)]
#[command(
    name = "riptide",
    version,
    about = "Watch and control Transmission daemons from the command line",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use (defaults to `default_server`)
    #[arg(long, short = 's', env = "RIPTIDE_SERVER", global = true)]
    pub server: Option<String>,

    /// Path to the configuration file
    #[arg(long, env = "RIPTIDE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default)
    Table,
    /// One identifier per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    All,
    Downloading,
    Active,
    Inactive,
    Ended,
    Stopped,
    Error,
}

impl From<CategoryArg> for StatusCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::All => Self::All,
            CategoryArg::Downloading => Self::Downloading,
            CategoryArg::Active => Self::Active,
            CategoryArg::Inactive => Self::Inactive,
            CategoryArg::Ended => Self::Ended,
            CategoryArg::Stopped => Self::Stopped,
            CategoryArg::Error => Self::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QueueArg {
    Top,
    Up,
    Down,
    Bottom,
}

impl From<QueueArg> for QueueDirection {
    fn from(arg: QueueArg) -> Self {
        match arg {
            QueueArg::Top => Self::Top,
            QueueArg::Up => Self::Up,
            QueueArg::Down => Self::Down,
            QueueArg::Bottom => Self::Bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stay connected and print updates until Ctrl-C
    #[command(alias = "w")]
    Watch(ViewArgs),

    /// List torrents once
    #[command(alias = "ls")]
    List(ViewArgs),

    /// Show every field of one torrent
    Info { id: i64 },

    /// List configured servers
    Servers,

    /// Start torrents
    Start {
        #[arg(required = true)]
        ids: Vec<i64>,
        /// Bypass the download queue
        #[arg(long)]
        now: bool,
    },

    /// Stop torrents
    Stop {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Verify local data
    Verify {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Ask trackers for more peers
    Reannounce {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Move torrents within the download queue
    Queue {
        direction: QueueArg,
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Rename a torrent or one of its files
    Rename {
        id: i64,
        name: String,
        /// Path inside the torrent to rename (defaults to the torrent name)
        #[arg(long)]
        path: Option<String>,
    },

    /// Change the download location
    #[command(alias = "mv")]
    Move {
        #[arg(required = true)]
        ids: Vec<i64>,
        /// New download directory
        #[arg(long)]
        to: String,
        /// Only point the daemon at the new location; do not move data
        #[arg(long)]
        no_move: bool,
    },

    /// Remove torrents
    #[command(alias = "rm")]
    Remove {
        #[arg(required = true)]
        ids: Vec<i64>,
        /// Also delete downloaded data
        #[arg(long)]
        delete_data: bool,
    },

    /// Add torrents from magnet links, URLs or .torrent files
    Add(AddArgs),

    /// Choose which files of a torrent to download
    Files {
        id: i64,
        /// File indices to download
        #[arg(long, value_delimiter = ',')]
        want: Vec<i64>,
        /// File indices to skip
        #[arg(long, value_delimiter = ',')]
        skip: Vec<i64>,
    },

    /// Toggle alternative speed limits
    AltSpeed { state: Toggle },
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Status category to show
    #[arg(long, short = 'c', default_value = "all")]
    pub category: CategoryArg,

    /// Name substring, or `{p}:<folder>` for a download folder
    #[arg(long, short = 'f')]
    pub filter: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Magnet links, URLs, or paths to .torrent files
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Download directory
    #[arg(long)]
    pub dir: Option<String>,

    /// Add without starting
    #[arg(long)]
    pub paused: bool,
}
