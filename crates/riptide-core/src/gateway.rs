// ── RPC gateway seam ──
//
// The engine talks to daemons only through these traits. Production
// code uses `TransmissionGateway`; tests inject scripted fakes. Results
// stay as `riptide_api::Error` so every call site can run them through
// `guard::classify`.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use riptide_api::{
    ALL_FIELDS, Credentials, Error as ApiError, TransmissionClient, TransportConfig,
    WORKING_FIELDS,
};

use crate::command::{AddedTorrent, NewTorrent, QueueDirection};
use crate::model::{Endpoint, SecretRef, SessionInfo, SessionStats, Torrent};

/// Which torrent fields to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The fields the tick loop needs to classify and group.
    Working,
    /// Everything, for a single-torrent detail view.
    Full,
}

impl Projection {
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Working => WORKING_FIELDS,
            Self::Full => ALL_FIELDS,
        }
    }
}

/// Opens sessions against daemon endpoints.
#[async_trait]
pub trait RpcGateway: Send + Sync {
    async fn open_session(
        &self,
        endpoint: &Endpoint,
        credentials: Option<Credentials>,
    ) -> Result<Arc<dyn RpcSession>, ApiError>;
}

/// A handle to one daemon. Every call takes the session's cancellation token.
#[async_trait]
pub trait RpcSession: Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    async fn session_info(&self, cancel: &CancellationToken) -> Result<SessionInfo, ApiError>;

    async fn statistics(&self, cancel: &CancellationToken) -> Result<SessionStats, ApiError>;

    /// `ids = None` lists every torrent.
    async fn list_torrents(
        &self,
        projection: Projection,
        ids: Option<&[i64]>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Torrent>, ApiError>;

    async fn start(&self, ids: &[i64], now: bool, cancel: &CancellationToken) -> Result<(), ApiError>;

    async fn stop(&self, ids: &[i64], cancel: &CancellationToken) -> Result<(), ApiError>;

    async fn verify(&self, ids: &[i64], cancel: &CancellationToken) -> Result<(), ApiError>;

    async fn reannounce(&self, ids: &[i64], cancel: &CancellationToken) -> Result<(), ApiError>;

    async fn queue_move(
        &self,
        direction: QueueDirection,
        ids: &[i64],
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn rename(
        &self,
        id: i64,
        path: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn set_location(
        &self,
        ids: &[i64],
        location: &str,
        move_data: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn remove(
        &self,
        ids: &[i64],
        delete_data: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn add(
        &self,
        torrent: &NewTorrent,
        cancel: &CancellationToken,
    ) -> Result<AddedTorrent, ApiError>;

    async fn set_files(
        &self,
        id: i64,
        wanted: &[i64],
        unwanted: &[i64],
        cancel: &CancellationToken,
    ) -> Result<(), ApiError>;

    async fn set_alt_speed(&self, enabled: bool, cancel: &CancellationToken)
    -> Result<(), ApiError>;
}

// ── Host collaborators ───────────────────────────────────────────

/// Asks the user for a password. Returning `None` cancels the connect.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    async fn prompt(&self, endpoint: &Endpoint) -> Option<SecretString>;
}

/// Turns a [`SecretRef`] into a password.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, secret: &SecretRef) -> Option<SecretString>;
}

/// Prompt for hosts that cannot ask anyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

#[async_trait]
impl CredentialPrompt for NoPrompt {
    async fn prompt(&self, _endpoint: &Endpoint) -> Option<SecretString> {
        None
    }
}

/// Resolver for hosts without a secret store.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSecrets;

impl SecretResolver for NoSecrets {
    fn resolve(&self, _secret: &SecretRef) -> Option<SecretString> {
        None
    }
}

// ── Transmission adapter ─────────────────────────────────────────

/// [`RpcGateway`] backed by [`TransmissionClient`].
#[derive(Debug, Clone, Default)]
pub struct TransmissionGateway {
    transport: TransportConfig,
}

impl TransmissionGateway {
    pub fn new(transport: TransportConfig) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl RpcGateway for TransmissionGateway {
    async fn open_session(
        &self,
        endpoint: &Endpoint,
        credentials: Option<Credentials>,
    ) -> Result<Arc<dyn RpcSession>, ApiError> {
        let client = TransmissionClient::new(endpoint.url.clone(), credentials, &self.transport)?;
        Ok(Arc::new(TransmissionSession {
            endpoint: endpoint.clone(),
            client,
        }))
    }
}

struct TransmissionSession {
    endpoint: Endpoint,
    client: TransmissionClient,
}

#[async_trait]
impl RpcSession for TransmissionSession {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn session_info(&self, cancel: &CancellationToken) -> Result<SessionInfo, ApiError> {
        self.client.session_get(cancel).await.map(SessionInfo::from)
    }

    async fn statistics(&self, cancel: &CancellationToken) -> Result<SessionStats, ApiError> {
        self.client.session_stats(cancel).await.map(SessionStats::from)
    }

    async fn list_torrents(
        &self,
        projection: Projection,
        ids: Option<&[i64]>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Torrent>, ApiError> {
        let raw = self
            .client
            .torrent_get(projection.fields(), ids, cancel)
            .await?;
        Ok(raw.into_iter().map(Torrent::from).collect())
    }

    async fn start(&self, ids: &[i64], now: bool, cancel: &CancellationToken) -> Result<(), ApiError> {
        if now {
            self.client.torrent_start_now(ids, cancel).await
        } else {
            self.client.torrent_start(ids, cancel).await
        }
    }

    async fn stop(&self, ids: &[i64], cancel: &CancellationToken) -> Result<(), ApiError> {
        self.client.torrent_stop(ids, cancel).await
    }

    async fn verify(&self, ids: &[i64], cancel: &CancellationToken) -> Result<(), ApiError> {
        self.client.torrent_verify(ids, cancel).await
    }

    async fn reannounce(&self, ids: &[i64], cancel: &CancellationToken) -> Result<(), ApiError> {
        self.client.torrent_reannounce(ids, cancel).await
    }

    async fn queue_move(
        &self,
        direction: QueueDirection,
        ids: &[i64],
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.client.queue_move(direction, ids, cancel).await
    }

    async fn rename(
        &self,
        id: i64,
        path: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.client.torrent_rename_path(id, path, name, cancel).await
    }

    async fn set_location(
        &self,
        ids: &[i64],
        location: &str,
        move_data: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.client
            .torrent_set_location(ids, location, move_data, cancel)
            .await
    }

    async fn remove(
        &self,
        ids: &[i64],
        delete_data: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.client.torrent_remove(ids, delete_data, cancel).await
    }

    async fn add(
        &self,
        torrent: &NewTorrent,
        cancel: &CancellationToken,
    ) -> Result<AddedTorrent, ApiError> {
        let added = self
            .client
            .torrent_add(
                &torrent.source,
                torrent.download_dir.as_deref(),
                torrent.paused,
                cancel,
            )
            .await?;
        Ok(AddedTorrent {
            id: added.id,
            name: added.name,
            hash: added.hash_string,
        })
    }

    async fn set_files(
        &self,
        id: i64,
        wanted: &[i64],
        unwanted: &[i64],
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.client
            .torrent_set_files(&[id], wanted, unwanted, cancel)
            .await
    }

    async fn set_alt_speed(
        &self,
        enabled: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.client.session_set_alt_speed(enabled, cancel).await
    }
}
