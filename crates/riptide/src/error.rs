//! CLI error types with miette diagnostics.
//!
//! Maps engine and config failures into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use riptide_config::ConfigError;
use riptide_core::{CoreError, Failure};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to '{server}': {message}")]
    #[diagnostic(
        code(riptide::connection_failed),
        help("Check that transmission-daemon is running and its RPC port is reachable.")
    )]
    ConnectionFailed { server: String, message: String },

    #[error("Lost connection to '{server}': {message}")]
    #[diagnostic(code(riptide::connection_lost))]
    ConnectionLost { server: String, message: String },

    #[error("Timed out waiting for '{server}'")]
    #[diagnostic(code(riptide::timeout))]
    Timeout { server: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for '{server}'")]
    #[diagnostic(
        code(riptide::auth_failed),
        help(
            "Verify the username and password of this profile.\n\
             Passwords are read from `password_env`, the system keyring \
             (service `riptide`, account `{server}/password`), then `password`."
        )
    )]
    AuthFailed { server: String },

    #[error("Password prompt for '{server}' was cancelled")]
    #[diagnostic(code(riptide::prompt_cancelled))]
    PromptCancelled { server: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No servers configured")]
    #[diagnostic(
        code(riptide::no_servers),
        help("Add a [servers.<name>] section to {path}")
    )]
    NoServers { path: String },

    #[error("Server '{name}' not found in configuration")]
    #[diagnostic(code(riptide::server_not_found), help("Available servers: {available}"))]
    ServerNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(riptide::config))]
    Config(#[from] ConfigError),

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Torrent {id} not found")]
    #[diagnostic(code(riptide::not_found), help("Run: riptide list"))]
    TorrentNotFound { id: i64 },

    #[error("'{command}' failed: {message}")]
    #[diagnostic(code(riptide::command_failed))]
    CommandFailed { command: String, message: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(riptide::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(riptide::engine))]
    Core(CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ConnectionLost { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::PromptCancelled { .. } => exit_code::AUTH,
            Self::TorrentNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ServerNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Classify a connect failure reported by the engine.
    pub fn connect_failed(server: &str, failure: &Failure) -> Self {
        match failure {
            Failure::Daemon(message) if message.starts_with("Authentication failed") => {
                Self::AuthFailed {
                    server: server.into(),
                }
            }
            _ => Self::ConnectionFailed {
                server: server.into(),
                message: failure.message().to_owned(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TorrentNotFound { id } => Self::TorrentNotFound { id },
            CoreError::HostNotFound { host } => Self::ConnectionFailed {
                server: host,
                message: "host name could not be resolved".into(),
            },
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed {
                server: url,
                message: reason,
            },
            CoreError::Rejected { message } => Self::CommandFailed {
                command: "request".into(),
                message,
            },
            other => Self::Core(other),
        }
    }
}
