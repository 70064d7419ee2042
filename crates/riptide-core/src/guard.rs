// ── Response classification ──
//
// Every daemon call goes through `classify` before it may touch engine
// state. No retries happen here; callers decide what to do with the
// outcome.

use std::fmt;

use riptide_api::Error as ApiError;
use tracing::trace;

use crate::error::CoreError;
use crate::model::Endpoint;

/// Sub-kind of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The endpoint's host name did not resolve.
    NameResolution,
    /// Refused, reset, timed out or otherwise unreachable.
    Generic,
}

/// A failure below the RPC layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportKind,
    /// Display message. Name-resolution failures name the endpoint.
    pub message: String,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The failing half of an [`Outcome`], kept when a session ends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Transport(TransportFailure),
    Daemon(String),
}

impl Failure {
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(failure) => &failure.message,
            Self::Daemon(message) => message,
        }
    }

    /// `None` for daemon-reported failures.
    pub fn transport_kind(&self) -> Option<TransportKind> {
        match self {
            Self::Transport(failure) => Some(failure.kind),
            Self::Daemon(_) => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Classified result of one daemon call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ok(T),
    Transport(TransportFailure),
    /// Daemon-reported or protocol-level failure (auth, bad result, malformed body).
    Daemon(String),
    /// The session's cancellation token fired. Not a failure.
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Failure text for display; `None` for `Ok` and `Cancelled`.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Transport(failure) => Some(&failure.message),
            Self::Daemon(message) => Some(message),
            Self::Ok(_) | Self::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ok(value) => Outcome::Ok(f(value)),
            Self::Transport(failure) => Outcome::Transport(failure),
            Self::Daemon(message) => Outcome::Daemon(message),
            Self::Cancelled => Outcome::Cancelled,
        }
    }

    pub fn into_result(self) -> Result<T, CoreError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Transport(failure) => Err(CoreError::Unreachable {
                message: failure.message,
            }),
            Self::Daemon(message) => Err(CoreError::Rejected { message }),
            Self::Cancelled => Err(CoreError::Cancelled),
        }
    }
}

/// Classify a gateway result for a call made against `endpoint`.
pub fn classify<T>(result: Result<T, ApiError>, endpoint: &Endpoint) -> Outcome<T> {
    let err = match result {
        Ok(value) => return Outcome::Ok(value),
        Err(err) => err,
    };
    trace!(error = %err, endpoint = %endpoint, "classifying failure");

    match err {
        ApiError::Cancelled => Outcome::Cancelled,
        ApiError::NameResolution { .. } => Outcome::Transport(TransportFailure {
            kind: TransportKind::NameResolution,
            message: format!("Unable to resolve host '{}'", endpoint.url),
        }),
        ApiError::Connect { .. }
        | ApiError::Timeout { .. }
        | ApiError::Transport(_)
        | ApiError::Tls(_) => Outcome::Transport(TransportFailure {
            kind: TransportKind::Generic,
            message: err.to_string(),
        }),
        ApiError::InvalidUrl(_)
        | ApiError::Authentication { .. }
        | ApiError::Forbidden { .. }
        | ApiError::SessionHandshake
        | ApiError::Http { .. }
        | ApiError::Rpc { .. }
        | ApiError::Deserialization { .. } => Outcome::Daemon(err.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::new("nas", "http://nas.invalid:9091/transmission/rpc".parse().unwrap())
    }

    #[test]
    fn ok_passes_through() {
        assert_eq!(classify(Ok::<_, ApiError>(7), &endpoint()), Outcome::Ok(7));
    }

    #[test]
    fn name_resolution_names_the_endpoint() {
        let outcome = classify::<()>(
            Err(ApiError::NameResolution {
                host: "nas.invalid".into(),
                message: "dns error".into(),
            }),
            &endpoint(),
        );
        match outcome {
            Outcome::Transport(failure) => {
                assert_eq!(failure.kind, TransportKind::NameResolution);
                assert!(failure.message.contains("http://nas.invalid:9091/transmission/rpc"));
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[test]
    fn refused_connection_is_generic_transport() {
        let outcome = classify::<()>(
            Err(ApiError::Connect {
                url: "http://nas".into(),
                message: "connection refused".into(),
            }),
            &endpoint(),
        );
        assert!(matches!(
            outcome,
            Outcome::Transport(TransportFailure {
                kind: TransportKind::Generic,
                ..
            })
        ));
    }

    #[test]
    fn auth_and_result_failures_are_daemon_errors() {
        let auth = classify::<()>(
            Err(ApiError::Authentication {
                message: "401".into(),
            }),
            &endpoint(),
        );
        assert!(matches!(auth, Outcome::Daemon(_)));

        let rpc = classify::<()>(
            Err(ApiError::Rpc {
                result: "duplicate torrent".into(),
            }),
            &endpoint(),
        );
        assert_eq!(rpc.failure_message(), Some("Daemon error: duplicate torrent"));
    }

    #[test]
    fn failure_keeps_transport_kind() {
        let failure = Failure::Transport(TransportFailure {
            kind: TransportKind::NameResolution,
            message: "Unable to resolve host".into(),
        });
        assert_eq!(failure.transport_kind(), Some(TransportKind::NameResolution));
        assert_eq!(failure.to_string(), "Unable to resolve host");

        let daemon = Failure::Daemon("Daemon error: busy".into());
        assert_eq!(daemon.transport_kind(), None);
        assert_eq!(daemon.message(), "Daemon error: busy");
    }

    #[test]
    fn cancellation_is_not_a_failure() {
        let outcome = classify::<()>(Err(ApiError::Cancelled), &endpoint());
        assert!(outcome.is_cancelled());
        assert!(outcome.failure_message().is_none());
    }
}
