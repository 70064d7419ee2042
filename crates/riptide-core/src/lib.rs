//! Connection, polling and reconciliation engine for Transmission clients.
//!
//! This crate sits between `riptide-api` and any host (CLI, TUI, GUI):
//!
//! - **[`ConnectionController`]**: Top-level orchestrator. Reacts to host
//!   events (switch server, add/remove server, retry) and decides when the
//!   supervisor connects, disconnects or reconnects. Queues torrents added
//!   before a session exists.
//!
//! - **[`PollingSupervisor`]**: Owns one session at a time. Resolves
//!   credentials, opens the session, runs the non-overlapping tick loop,
//!   and tears everything down on cancel or fault.
//!
//! - **[`EntityTable`]**: The replace-on-poll torrent table. Every publish
//!   produces an immutable [`Snapshot`] with the filtered view, per-category
//!   counts, folder categories and status line, observed through
//!   [`SnapshotStream`].
//!
//! - **[`CommandDispatcher`]**: Runs user mutations against the active
//!   session. Failures become outcomes and [`EngineEvent`]s, never panics
//!   or session teardowns.
//!
//! - **[`RpcGateway`]**: The seam to the daemon. Production code uses
//!   [`TransmissionGateway`]; tests inject scripted fakes.

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod events;
pub mod filter;
pub mod format;
pub mod gateway;
pub mod guard;
pub mod model;
pub mod store;
pub mod stream;
pub mod supervisor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{
    AddSource, AddedTorrent, Command, CommandDispatcher, CommandOutcome, NewTorrent,
    QueueDirection,
};
pub use config::EngineConfig;
pub use controller::{ConnectionController, ControlEvent, EndpointSource};
pub use error::CoreError;
pub use events::EngineEvent;
pub use filter::TextFilter;
pub use gateway::{
    CredentialPrompt, NoPrompt, NoSecrets, Projection, RpcGateway, RpcSession, SecretResolver,
    TransmissionGateway,
};
pub use guard::{Failure, Outcome, TransportFailure, TransportKind};
pub use store::{EntityTable, FolderDelta, Publication, Snapshot};
pub use stream::SnapshotStream;
pub use supervisor::{Activity, ConnectionState, PollingSupervisor, Session, Stage};

pub use model::{
    Endpoint, FolderCategory, SecretRef, SessionInfo, SessionStats, StatusCategory, StatusCounts,
    Torrent, TorrentFile, TorrentStatus, TrackerStat,
};

// Transport knobs hosts need to build a gateway.
pub use riptide_api::{Credentials, TlsMode, TransportConfig};
