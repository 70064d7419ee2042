// ── Core error types ──
//
// User-facing errors from riptide-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<riptide_api::Error>`
// impl translates wire errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot resolve host '{host}'")]
    HostNotFound { host: String },

    #[error("Cannot connect to daemon at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Transport failure already phrased for display.
    #[error("{message}")]
    Unreachable { message: String },

    #[error("Not connected to a daemon")]
    NotConnected,

    #[error("Request timed out")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Daemon rejected the request: {message}")]
    Rejected { message: String },

    #[error("Torrent not found: {id}")]
    TorrentNotFound { id: i64 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from wire-level errors ────────────────────────────────

impl From<riptide_api::Error> for CoreError {
    fn from(err: riptide_api::Error) -> Self {
        use riptide_api::Error as Api;
        match err {
            Api::NameResolution { host, .. } => CoreError::HostNotFound { host },
            Api::Connect { url, message } => CoreError::ConnectionFailed {
                url,
                reason: message,
            },
            Api::Timeout { .. } => CoreError::Timeout,
            Api::Transport(e) => CoreError::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            Api::Tls(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {reason}"),
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Authentication { message } | Api::Forbidden { message } => {
                CoreError::AuthenticationFailed { message }
            }
            Api::SessionHandshake => CoreError::Rejected {
                message: "session id handshake failed".into(),
            },
            Api::Http { status, body } => CoreError::Rejected {
                message: format!("HTTP {status}: {body}"),
            },
            Api::Rpc { result } => CoreError::Rejected { message: result },
            Api::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            Api::Cancelled => CoreError::Cancelled,
        }
    }
}
