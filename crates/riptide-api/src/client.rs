// Transmission RPC HTTP client
//
// Wraps `reqwest::Client` with the daemon's JSON envelope, the
// `X-Transmission-Session-Id` CSRF handshake, and basic auth. Method
// wrappers live in `session.rs` and `torrents.rs` as inherent impls so
// this module stays focused on transport mechanics.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{RpcRequest, RpcResponse};
use crate::transport::TransportConfig;

/// Header carrying the daemon's anti-CSRF session id.
pub const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Default RPC path of a stock daemon.
pub const DEFAULT_RPC_PATH: &str = "/transmission/rpc";

/// Basic-auth credentials for the daemon.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Raw HTTP client for one Transmission daemon.
///
/// All methods return the unwrapped `arguments` payload. A non-`success`
/// result string becomes [`Error::Rpc`]; the caller never sees the envelope.
pub struct TransmissionClient {
    http: reqwest::Client,
    url: Url,
    credentials: Option<Credentials>,
    /// Session id captured from the last 409 answer. Sent on every request
    /// and replaced whenever the daemon rotates it.
    session_id: RwLock<Option<String>>,
    tag: AtomicU64,
}

impl TransmissionClient {
    /// Create a client for the RPC endpoint at `url`.
    pub fn new(
        url: Url,
        credentials: Option<Credentials>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, url, credentials))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, url: Url, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            url,
            credentials,
            session_id: RwLock::new(None),
            tag: AtomicU64::new(1),
        }
    }

    /// The RPC endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The session id currently held, if the handshake has happened.
    pub fn session_id(&self) -> Option<String> {
        self.session_id
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn store_session_id(&self, id: String) {
        trace!("session id rotated");
        match self.session_id.write() {
            Ok(mut guard) => *guard = Some(id),
            Err(poisoned) => *poisoned.into_inner() = Some(id),
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Issue one RPC call, abandoning it if `cancel` fires first.
    pub async fn call<A, R>(
        &self,
        method: &str,
        arguments: Option<&A>,
        cancel: &CancellationToken,
    ) -> Result<R, Error>
    where
        A: Serialize + Sync,
        R: DeserializeOwned,
    {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = self.exchange(method, arguments) => result,
        }
    }

    async fn exchange<A, R>(&self, method: &str, arguments: Option<&A>) -> Result<R, Error>
    where
        A: Serialize + Sync,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            method,
            arguments,
            tag: self.tag.fetch_add(1, Ordering::Relaxed),
        };

        // The first 409 hands out a session id; a second one means the
        // daemon refuses the id it just issued.
        for _ in 0..2 {
            debug!(method, url = %self.url, "rpc call");

            let mut builder = self.http.post(self.url.clone()).json(&request);
            if let Some(id) = self.session_id() {
                builder = builder.header(SESSION_ID_HEADER, id);
            }
            if let Some(ref creds) = self.credentials {
                builder = builder.basic_auth(&creds.username, Some(creds.password.expose_secret()));
            }

            let resp = builder
                .send()
                .await
                .map_err(|e| Error::from_reqwest(e, &self.url))?;

            if resp.status() == reqwest::StatusCode::CONFLICT {
                let id = resp
                    .headers()
                    .get(SESSION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from)
                    .ok_or(Error::SessionHandshake)?;
                self.store_session_id(id);
                continue;
            }

            return self.parse_envelope(resp).await;
        }

        Err(Error::SessionHandshake)
    }

    /// Check the HTTP status, then unwrap `{result, arguments}`.
    async fn parse_envelope<R: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<R, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "daemon rejected the credentials (HTTP 401)".into(),
            });
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Forbidden {
                message: body.chars().take(200).collect(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_reqwest(e, &self.url))?;

        let envelope: RpcResponse<R> = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        if envelope.result != "success" {
            return Err(Error::Rpc {
                result: envelope.result,
            });
        }

        match envelope.arguments {
            Some(arguments) => Ok(arguments),
            // Some methods answer without an `arguments` object at all.
            None => serde_json::from_str("{}").map_err(|e| Error::Deserialization {
                message: format!("response carried no arguments: {e}"),
                body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "admin".into(),
            password: SecretString::from("hunter2"),
        };
        let shown = format!("{creds:?}");
        assert!(shown.contains("admin"));
        assert!(!shown.contains("hunter2"));
    }
}
