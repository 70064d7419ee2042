// ── Polling supervisor ──
//
// Owns the connection lifecycle for one daemon at a time: credential
// resolution, session open, the tick loop, and teardown. Each session
// runs as a single background task, so tick iterations never overlap and
// starting a new session always joins the previous task first.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use riptide_api::Credentials;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::events::EngineEvent;
use crate::filter;
use crate::gateway::{CredentialPrompt, Projection, RpcGateway, RpcSession, SecretResolver};
use crate::guard::{self, Failure, Outcome};
use crate::model::{Endpoint, FolderCategory, SessionInfo, StatusCategory};
use crate::store::{EntityTable, Publication, Snapshot};
use crate::stream::SnapshotStream;

const EVENT_CHANNEL_SIZE: usize = 256;

// ── ConnectionState ──────────────────────────────────────────────

/// Lifecycle state observable by consumers.
///
/// `ConnectFailed` and `Faulted` are transient: teardown always ends in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
    ConnectFailed,
    Faulted,
}

// ── Activity ─────────────────────────────────────────────────────

/// Daemon call the supervisor is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Session,
    Statistics,
    Torrents,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Session => "opening session",
            Self::Statistics => "fetching statistics",
            Self::Torrents => "fetching torrents",
        })
    }
}

/// In-flight stage with its start time, for busy indicators.
#[derive(Debug, Clone, Copy)]
pub struct Activity {
    pub stage: Stage,
    pub since: Instant,
}

impl Activity {
    /// `true` once the stage has run for at least `grace`.
    pub fn is_long_running(&self, grace: Duration) -> bool {
        self.since.elapsed() >= grace
    }
}

// ── Session ──────────────────────────────────────────────────────

/// The live connection. Exists only while the supervisor is `Connected`.
pub struct Session {
    rpc: Arc<dyn RpcSession>,
    info: SessionInfo,
    cancel: CancellationToken,
}

impl Session {
    pub fn rpc(&self) -> &Arc<dyn RpcSession> {
        &self.rpc
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.rpc.endpoint()
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Cancelled when the session is torn down.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", self.endpoint())
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

// ── PollingSupervisor ────────────────────────────────────────────

/// Connection lifecycle and polling loop.
///
/// Cheaply cloneable via `Arc<SupervisorInner>`. All published state lives
/// in the [`EntityTable`]; this type decides when it is refreshed.
#[derive(Clone)]
pub struct PollingSupervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    gateway: Arc<dyn RpcGateway>,
    prompt: Arc<dyn CredentialPrompt>,
    secrets: Arc<dyn SecretResolver>,
    config: EngineConfig,
    table: EntityTable,
    state: watch::Sender<ConnectionState>,
    activity: watch::Sender<Option<Activity>>,
    event_tx: broadcast::Sender<EngineEvent>,
    /// Lifecycle signals. Kept off the event feed so folder deltas cannot
    /// push them out of a lagging receiver.
    connected: watch::Sender<Option<Endpoint>>,
    reconnects: watch::Sender<u64>,
    /// Parent of every session token; cancelled once on shutdown.
    shutdown: CancellationToken,
    /// The session task, if one was started. Serializes start/stop.
    running: Mutex<Option<Running>>,
    session: ArcSwapOption<Session>,
    lifecycle: std::sync::Mutex<Lifecycle>,
    connect_error: AtomicBool,
    last_failure: ArcSwapOption<Failure>,
}

struct Running {
    endpoint: Endpoint,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Guarded together so a reconnect request cannot slip past a teardown
/// that already checked the flag.
#[derive(Default)]
struct Lifecycle {
    alive: bool,
    reconnect_requested: bool,
}

/// Why a session task ended.
#[derive(Debug)]
enum Exit {
    Cancelled,
    PromptDismissed,
    ConnectFailed(Failure),
    Faulted(Failure),
}

impl PollingSupervisor {
    pub fn new(
        gateway: Arc<dyn RpcGateway>,
        prompt: Arc<dyn CredentialPrompt>,
        secrets: Arc<dyn SecretResolver>,
        config: EngineConfig,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        let (activity, _) = watch::channel(None);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (connected, _) = watch::channel(None);
        let (reconnects, _) = watch::channel(0);

        Self {
            inner: Arc::new(SupervisorInner {
                gateway,
                prompt,
                secrets,
                config,
                table: EntityTable::new(),
                state,
                activity,
                event_tx,
                connected,
                reconnects,
                shutdown: CancellationToken::new(),
                running: Mutex::new(None),
                session: ArcSwapOption::empty(),
                lifecycle: std::sync::Mutex::new(Lifecycle::default()),
                connect_error: AtomicBool::new(false),
                last_failure: ArcSwapOption::empty(),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn table(&self) -> &EntityTable {
        &self.inner.table
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Connect to `endpoint` in the background.
    ///
    /// No-op while already connecting or connected to the same endpoint.
    /// Any other running session is fully torn down before the new one
    /// begins.
    pub async fn start(&self, endpoint: Endpoint) {
        let mut running = self.inner.running.lock().await;

        if let Some(current) = running.as_ref() {
            let state = *self.inner.state.borrow();
            if current.endpoint == endpoint
                && !current.handle.is_finished()
                && matches!(state, ConnectionState::Connecting | ConnectionState::Connected)
            {
                debug!(endpoint = %endpoint, "already connecting or connected");
                return;
            }
        }

        if let Some(previous) = running.take() {
            self.join(previous).await;
        }

        if self.inner.shutdown.is_cancelled() {
            debug!("supervisor shut down; ignoring start");
            return;
        }

        let cancel = self.inner.shutdown.child_token();
        self.lock_lifecycle().alive = true;
        self.set_state(ConnectionState::Connecting);
        info!(endpoint = %endpoint, "connecting");

        let handle = tokio::spawn(session_task(self.clone(), endpoint.clone(), cancel.clone()));
        *running = Some(Running {
            endpoint,
            cancel,
            handle,
        });
    }

    /// Cancel the current session and wait for its teardown.
    ///
    /// An in-flight daemon call is abandoned through the session token.
    pub async fn stop(&self) {
        let mut running = self.inner.running.lock().await;
        if let Some(current) = running.take() {
            self.join(current).await;
        }
        self.set_state(ConnectionState::Idle);
    }

    /// Tear down the current session because the host wants to switch.
    ///
    /// Returns `true` if a session was running; its teardown then emits
    /// [`EngineEvent::ReconnectAllowed`] and bumps [`reconnects`](Self::reconnects).
    /// Returns `false` if nothing was running and the caller may connect
    /// right away.
    pub async fn request_reconnect(&self) -> bool {
        let running = self.inner.running.lock().await;
        let Some(current) = running.as_ref() else {
            return false;
        };
        {
            let mut lifecycle = self.lock_lifecycle();
            if !lifecycle.alive {
                return false;
            }
            lifecycle.reconnect_requested = true;
        }
        debug!(endpoint = %current.endpoint, "reconnect requested");
        current.cancel.cancel();
        true
    }

    /// Stop for good. Later `start` calls are ignored.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.stop().await;
    }

    async fn join(&self, running: Running) {
        running.cancel.cancel();
        if !running.handle.is_finished() {
            self.set_state(ConnectionState::Disconnecting);
        }
        if let Err(e) = running.handle.await {
            warn!(error = %e, endpoint = %running.endpoint, "session task ended abnormally");
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Endpoint of the live session, updated on every connect and teardown.
    pub fn connected(&self) -> watch::Receiver<Option<Endpoint>> {
        self.inner.connected.subscribe()
    }

    /// Counts teardowns that ended a requested reconnect.
    pub fn reconnects(&self) -> watch::Receiver<u64> {
        self.inner.reconnects.subscribe()
    }

    pub fn activity(&self) -> watch::Receiver<Option<Activity>> {
        self.inner.activity.subscribe()
    }

    /// `true` when a stage has been running longer than the configured grace.
    pub fn is_busy(&self) -> bool {
        self.inner
            .activity
            .borrow()
            .is_some_and(|a| a.is_long_running(self.inner.config.busy_grace))
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.inner.session.load_full()
    }

    pub fn connected_endpoint(&self) -> Option<Endpoint> {
        self.session().map(|s| s.endpoint().clone())
    }

    pub fn is_connected(&self) -> bool {
        self.inner.session.load().is_some()
    }

    /// Set when the last connect attempt failed or its prompt was dismissed.
    pub fn connect_error(&self) -> bool {
        self.inner.connect_error.load(Ordering::Acquire)
    }

    pub fn clear_connect_error(&self) {
        self.inner.connect_error.store(false, Ordering::Release);
        self.inner.last_failure.store(None);
    }

    /// Why the last connect attempt or session failed.
    pub fn last_failure(&self) -> Option<Failure> {
        self.inner.last_failure.load_full().map(|f| (*f).clone())
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_failure().map(|f| f.message().to_owned())
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.table.snapshot()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.table.subscribe()
    }

    // ── View filter ──────────────────────────────────────────────

    pub async fn set_category(&self, category: StatusCategory) {
        let publication = self.inner.table.set_category(category).await;
        self.announce(publication);
    }

    pub async fn set_filter(&self, text: impl Into<String>) {
        let publication = self.inner.table.set_filter(text).await;
        self.announce(publication);
    }

    pub async fn filter_folder(&self, folder: &FolderCategory) {
        self.set_filter(filter::folder_filter(folder)).await;
    }

    pub async fn clear_filter(&self) {
        self.set_filter(String::new()).await;
    }

    // ── Internals shared with the dispatcher ─────────────────────

    pub(crate) fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.inner.event_tx.send(event);
    }

    pub(crate) fn announce(&self, publication: Publication) {
        for delta in publication.folder_deltas {
            self.emit(EngineEvent::Folder(delta));
        }
        if let Some(line) = publication.status_line {
            self.emit(EngineEvent::StatusLine(line));
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.inner.state.send_replace(state);
    }

    fn set_activity(&self, stage: Option<Stage>) {
        self.inner.activity.send_replace(stage.map(|stage| Activity {
            stage,
            since: Instant::now(),
        }));
    }

    fn lock_lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.inner
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Session task ─────────────────────────────────────────────────

/// Connect, poll until cancelled or faulted, then tear down.
async fn session_task(supervisor: PollingSupervisor, endpoint: Endpoint, cancel: CancellationToken) {
    let exit = match connect(&supervisor, &endpoint, &cancel).await {
        Ok(session) => {
            let session = Arc::new(session);
            supervisor.inner.session.store(Some(Arc::clone(&session)));
            supervisor
                .inner
                .connect_error
                .store(false, Ordering::Release);
            supervisor.set_state(ConnectionState::Connected);
            info!(
                endpoint = %endpoint,
                version = %session.info.version,
                rpc_version = %session.info.rpc_version,
                "connected to server"
            );
            supervisor.inner.connected.send_replace(Some(endpoint.clone()));
            supervisor.emit(EngineEvent::ConnectedServerChanged(Some(endpoint.clone())));

            let publication = supervisor
                .inner
                .table
                .set_session_info(session.info.clone())
                .await;
            supervisor.announce(publication);

            tick_loop(&supervisor, &session).await
        }
        Err(exit) => exit,
    };

    teardown(&supervisor, &endpoint, exit).await;
}

async fn connect(
    supervisor: &PollingSupervisor,
    endpoint: &Endpoint,
    cancel: &CancellationToken,
) -> Result<Session, Exit> {
    let credentials = resolve_credentials(supervisor, endpoint, cancel).await?;

    supervisor.set_activity(Some(Stage::Session));
    let opened = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Exit::Cancelled),
        opened = supervisor.inner.gateway.open_session(endpoint, credentials) => opened,
    };
    let rpc = settle(guard::classify(opened, endpoint), Exit::ConnectFailed)?;

    let info = settle(
        guard::classify(rpc.session_info(cancel).await, endpoint),
        Exit::ConnectFailed,
    )?;
    supervisor.set_activity(None);

    Ok(Session {
        rpc,
        info,
        cancel: cancel.clone(),
    })
}

/// Prompt or look up the password. A dismissed or empty prompt aborts
/// without contacting the daemon.
async fn resolve_credentials(
    supervisor: &PollingSupervisor,
    endpoint: &Endpoint,
    cancel: &CancellationToken,
) -> Result<Option<Credentials>, Exit> {
    let password = if endpoint.ask_for_password {
        let prompted = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Exit::Cancelled),
            prompted = supervisor.inner.prompt.prompt(endpoint) => prompted,
        };
        match prompted {
            Some(password) if !password.expose_secret().is_empty() => Some(password),
            _ => return Err(Exit::PromptDismissed),
        }
    } else {
        endpoint
            .secret
            .as_ref()
            .and_then(|secret| supervisor.inner.secrets.resolve(secret))
    };

    Ok(match (endpoint.username.clone(), password) {
        (None, None) => None,
        (username, password) => Some(Credentials {
            username: username.unwrap_or_default(),
            password: password.unwrap_or_else(|| SecretString::from(String::new())),
        }),
    })
}

/// Sequential ticks separated by the poll interval, measured from the end
/// of each tick's work.
async fn tick_loop(supervisor: &PollingSupervisor, session: &Session) -> Exit {
    let interval = supervisor.inner.config.poll_interval;
    loop {
        if let Err(exit) = tick(supervisor, session).await {
            return exit;
        }
        tokio::select! {
            biased;
            () = session.cancel.cancelled() => return Exit::Cancelled,
            () = tokio::time::sleep(interval) => {}
        }
    }
}

async fn tick(supervisor: &PollingSupervisor, session: &Session) -> Result<(), Exit> {
    let endpoint = session.endpoint();
    let cancel = &session.cancel;
    debug!(endpoint = %endpoint, "tick");

    supervisor.set_activity(Some(Stage::Statistics));
    let stats = settle(
        guard::classify(session.rpc.statistics(cancel).await, endpoint),
        Exit::Faulted,
    )?;

    supervisor.set_activity(Some(Stage::Torrents));
    let torrents = settle(
        guard::classify(
            session.rpc.list_torrents(Projection::Working, None, cancel).await,
            endpoint,
        ),
        Exit::Faulted,
    )?;
    supervisor.set_activity(None);

    debug!(count = torrents.len(), "torrents fetched");
    let publication = supervisor.inner.table.replace(torrents, stats).await;
    supervisor.announce(publication);
    Ok(())
}

async fn teardown(supervisor: &PollingSupervisor, endpoint: &Endpoint, exit: Exit) {
    let was_connected = supervisor.inner.session.swap(None).is_some();
    supervisor.set_activity(None);

    match exit {
        Exit::Cancelled => debug!(endpoint = %endpoint, "session cancelled"),
        Exit::PromptDismissed => {
            supervisor
                .inner
                .connect_error
                .store(true, Ordering::Release);
            supervisor.set_state(ConnectionState::ConnectFailed);
            debug!(endpoint = %endpoint, "password prompt dismissed");
        }
        Exit::ConnectFailed(failure) => {
            supervisor
                .inner
                .connect_error
                .store(true, Ordering::Release);
            supervisor.inner.last_failure.store(Some(Arc::new(failure.clone())));
            supervisor.set_state(ConnectionState::ConnectFailed);
            warn!(
                endpoint = %endpoint,
                error = %failure,
                kind = ?failure.transport_kind(),
                "connect failed"
            );
            supervisor.emit(EngineEvent::ConnectFailed {
                endpoint: endpoint.clone(),
                failure,
            });
        }
        Exit::Faulted(failure) => {
            supervisor.inner.last_failure.store(Some(Arc::new(failure.clone())));
            supervisor.set_state(ConnectionState::Faulted);
            warn!(endpoint = %endpoint, error = %failure, "polling stopped on error");
            supervisor.emit(EngineEvent::Faulted {
                endpoint: endpoint.clone(),
                failure,
            });
        }
    }

    let publication = supervisor.inner.table.clear().await;
    supervisor.announce(publication);

    if was_connected {
        supervisor.inner.connected.send_replace(None);
        supervisor.emit(EngineEvent::ConnectedServerChanged(None));
        info!(endpoint = %endpoint, "disconnected from server");
    }
    supervisor.set_state(ConnectionState::Idle);

    let reconnect = {
        let mut lifecycle = supervisor.lock_lifecycle();
        lifecycle.alive = false;
        std::mem::take(&mut lifecycle.reconnect_requested)
    };
    if reconnect {
        supervisor
            .inner
            .reconnects
            .send_modify(|n| *n = n.wrapping_add(1));
        supervisor.emit(EngineEvent::ReconnectAllowed);
    }
}

/// Split a classified outcome into the value or the matching exit.
fn settle<T>(outcome: Outcome<T>, on_failure: impl FnOnce(Failure) -> Exit) -> Result<T, Exit> {
    match outcome {
        Outcome::Ok(value) => Ok(value),
        Outcome::Cancelled => Err(Exit::Cancelled),
        Outcome::Transport(failure) => Err(on_failure(Failure::Transport(failure))),
        Outcome::Daemon(message) => Err(on_failure(Failure::Daemon(message))),
    }
}
