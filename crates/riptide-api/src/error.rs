use thiserror::Error;

/// Top-level error type for the `riptide-api` crate.
///
/// Covers every failure mode of a Transmission RPC exchange: transport,
/// HTTP-level authentication, the daemon's `result` envelope and payload
/// decoding. `riptide-core` classifies these into engine outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The daemon host name could not be resolved.
    #[error("Cannot resolve host '{host}'")]
    NameResolution { host: String, message: String },

    /// TCP connection failed (refused, unreachable, reset).
    #[error("Connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    /// Request timed out.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Any other HTTP transport error.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// Daemon rejected the credentials (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Daemon refused the client (HTTP 403, usually a whitelist rejection).
    #[error("Access forbidden: {message}")]
    Forbidden { message: String },

    /// The daemon kept answering 409 after the session id was refreshed.
    #[error("Session id handshake failed")]
    SessionHandshake,

    /// Unexpected HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── RPC ─────────────────────────────────────────────────────────
    /// The daemon answered with a non-`success` result string.
    #[error("Daemon error: {result}")]
    Rpc { result: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Control ─────────────────────────────────────────────────────
    /// The call was abandoned because its cancellation token fired.
    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if this error originates below the HTTP layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NameResolution { .. }
                | Self::Connect { .. }
                | Self::Timeout { .. }
                | Self::Transport(_)
        )
    }

    /// Returns `true` if re-issuing the same request might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Timeout { .. } | Self::SessionHandshake
        )
    }

    /// Returns `true` for credential rejections.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Forbidden { .. })
    }

    /// Returns `true` if the call was cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Translate a `reqwest` error into the most specific variant.
    ///
    /// `reqwest` does not expose DNS failures directly; hyper's connector
    /// reports them as a `"dns error"` somewhere in the source chain.
    pub(crate) fn from_reqwest(err: reqwest::Error, url: &url::Url) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                url: url.to_string(),
            };
        }
        if err.is_connect() {
            if source_chain_mentions(&err, "dns error") {
                return Self::NameResolution {
                    host: url.host_str().unwrap_or_default().to_owned(),
                    message: err.to_string(),
                };
            }
            return Self::Connect {
                url: url.to_string(),
                message: root_cause(&err),
            };
        }
        Self::Transport(err)
    }
}

fn source_chain_mentions(err: &(dyn std::error::Error + 'static), needle: &str) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.to_string().contains(needle) {
            return true;
        }
        current = e.source();
    }
    false
}

fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_family_is_recognised() {
        let err = Error::NameResolution {
            host: "nas.local".into(),
            message: "dns error".into(),
        };
        assert!(err.is_transport());
        assert!(!err.is_transient());

        let err = Error::Timeout {
            url: "http://nas.local:9091/transmission/rpc".into(),
        };
        assert!(err.is_transport());
        assert!(err.is_transient());
    }

    #[test]
    fn daemon_errors_are_not_transport() {
        let err = Error::Rpc {
            result: "invalid or corrupt torrent file".into(),
        };
        assert!(!err.is_transport());
        assert!(!err.is_auth());
        assert!(Error::Authentication { message: String::new() }.is_auth());
    }

    #[test]
    fn cancelled_is_distinct() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Cancelled.is_transport());
    }
}
