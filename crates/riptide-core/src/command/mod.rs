// ── Command types ──
//
// User-initiated mutations routed through the `CommandDispatcher`.
// Reads bypass this module and go straight to snapshots.

pub mod dispatcher;

pub use dispatcher::CommandDispatcher;
pub use riptide_api::{AddSource, QueueDirection};

/// A torrent to hand to the daemon.
#[derive(Debug, Clone)]
pub struct NewTorrent {
    pub source: AddSource,
    pub download_dir: Option<String>,
    pub paused: bool,
}

impl NewTorrent {
    /// Magnet link or URL.
    pub fn link(link: impl Into<String>) -> Self {
        Self {
            source: AddSource::Link(link.into()),
            download_dir: None,
            paused: false,
        }
    }

    /// Raw `.torrent` file content.
    pub fn metainfo(bytes: Vec<u8>) -> Self {
        Self {
            source: AddSource::Metainfo(bytes),
            download_dir: None,
            paused: false,
        }
    }

    #[must_use]
    pub fn into_dir(mut self, dir: impl Into<String>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }
}

/// Identity the daemon reports for an added (or duplicate) torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedTorrent {
    pub id: i64,
    pub name: String,
    pub hash: String,
}

/// A mutating operation against the connected daemon.
#[derive(Debug, Clone)]
pub enum Command {
    Start { ids: Vec<i64> },
    /// Start bypassing the queue.
    StartNow { ids: Vec<i64> },
    Stop { ids: Vec<i64> },
    Verify { ids: Vec<i64> },
    Reannounce { ids: Vec<i64> },
    QueueMove {
        ids: Vec<i64>,
        direction: QueueDirection,
    },
    /// Rename `path` (relative to the torrent root) to `name`.
    Rename { id: i64, path: String, name: String },
    /// Retried until the daemon accepts it; see `EngineConfig::relocate_retry`.
    Relocate {
        ids: Vec<i64>,
        location: String,
        move_data: bool,
    },
    Remove { ids: Vec<i64>, delete_data: bool },
    Add(NewTorrent),
    SetFiles {
        id: i64,
        wanted: Vec<i64>,
        unwanted: Vec<i64>,
    },
    SetAltSpeed { enabled: bool },
}

impl Command {
    /// Short name for logs and failure events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::StartNow { .. } => "start-now",
            Self::Stop { .. } => "stop",
            Self::Verify { .. } => "verify",
            Self::Reannounce { .. } => "reannounce",
            Self::QueueMove { .. } => "queue-move",
            Self::Rename { .. } => "rename",
            Self::Relocate { .. } => "relocate",
            Self::Remove { .. } => "remove",
            Self::Add(_) => "add",
            Self::SetFiles { .. } => "set-files",
            Self::SetAltSpeed { .. } => "alt-speed",
        }
    }
}

/// How a command ended. Failures are reported here and as an event,
/// never as an `Err` to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    Added(AddedTorrent),
    /// No session was active; nothing was sent.
    NotConnected,
    Failed(String),
    Cancelled,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done | Self::Added(_))
    }
}
