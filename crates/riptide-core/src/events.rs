// ── Engine events ──
//
// Everything the engine reports to its host besides snapshots. Sent on a
// `broadcast` channel; slow subscribers may lag and miss events. Snapshots
// and the supervisor's `connected()` / `reconnects()` watches carry the
// authoritative state.

use crate::guard::Failure;
use crate::model::Endpoint;
use crate::store::FolderDelta;

/// Events produced by the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A session reached `Connected` (`Some`) or was torn down (`None`).
    ConnectedServerChanged(Option<Endpoint>),
    /// Incremental change to the folder categories.
    Folder(FolderDelta),
    /// New status line text.
    StatusLine(String),
    /// Teardown after a requested reconnect finished; a new session may start.
    ReconnectAllowed,
    /// A connect attempt failed before reaching `Connected`.
    ConnectFailed { endpoint: Endpoint, failure: Failure },
    /// A connected session ended on an error.
    Faulted { endpoint: Endpoint, failure: Failure },
    /// A connection was requested but no endpoint is known.
    ConnectionManagerRequested,
    /// A user command failed. Never tears the session down.
    CommandFailed { command: &'static str, message: String },
}
