// ── Connection controller ──
//
// Top-level orchestrator. Reacts to host events (server switch, server
// list edits, retry) and to the supervisor's lifecycle watches, and decides
// when the supervisor starts, stops or restarts. Also owns the list of
// known endpoints and the queue of torrents added before a session exists.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandDispatcher, NewTorrent};
use crate::error::CoreError;
use crate::events::EngineEvent;
use crate::model::Endpoint;
use crate::supervisor::PollingSupervisor;

const CONTROL_CHANNEL_SIZE: usize = 64;

/// Events a host sends to the controller.
#[derive(Debug, Clone)]
pub enum ControlEvent {
    /// Switch to `endpoint`, tearing down the current session first.
    ReconnectRequested(Endpoint),
    /// The previous session is gone; connect to the selected endpoint.
    ReconnectAllowed,
    ServerAdded(Endpoint),
    ServerRemoved(Endpoint),
    /// The host's notion of the connected server changed.
    ConnectedServerChanged(Option<Endpoint>),
    /// Clear the error flag, reload endpoints, and connect again.
    Retry,
    Shutdown,
}

/// Reloads the known endpoints, e.g. from a config file.
pub trait EndpointSource: Send + Sync {
    fn load(&self) -> Result<Vec<Endpoint>, CoreError>;
}

/// Orchestrates a [`PollingSupervisor`] from host events.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct ConnectionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    supervisor: PollingSupervisor,
    dispatcher: CommandDispatcher,
    /// Copy-on-write; readers get a stable `Arc<Vec<_>>` to iterate.
    endpoints: ArcSwap<Vec<Endpoint>>,
    selected: ArcSwapOption<Endpoint>,
    /// Endpoint the host marks as connected in its menus.
    checked: ArcSwapOption<Endpoint>,
    source: Option<Arc<dyn EndpointSource>>,
    control_tx: mpsc::Sender<ControlEvent>,
    control_rx: Mutex<Option<mpsc::Receiver<ControlEvent>>>,
    pending_adds: Mutex<Vec<NewTorrent>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionController {
    pub fn new(supervisor: PollingSupervisor, endpoints: Vec<Endpoint>) -> Self {
        Self::build(supervisor, endpoints, None)
    }

    /// Like [`new`](Self::new), with a source consulted on [`ControlEvent::Retry`].
    pub fn with_source(supervisor: PollingSupervisor, source: Arc<dyn EndpointSource>) -> Self {
        let endpoints = source.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not load endpoints");
            Vec::new()
        });
        Self::build(supervisor, endpoints, Some(source))
    }

    fn build(
        supervisor: PollingSupervisor,
        endpoints: Vec<Endpoint>,
        source: Option<Arc<dyn EndpointSource>>,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_SIZE);
        let dispatcher = CommandDispatcher::new(supervisor.clone());
        let mut unique: Vec<Endpoint> = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            if !unique.contains(&endpoint) {
                unique.push(endpoint);
            }
        }

        Self {
            inner: Arc::new(ControllerInner {
                supervisor,
                dispatcher,
                endpoints: ArcSwap::from_pointee(unique),
                selected: ArcSwapOption::empty(),
                checked: ArcSwapOption::empty(),
                source,
                control_tx,
                control_rx: Mutex::new(Some(control_rx)),
                pending_adds: Mutex::new(Vec::new()),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn supervisor(&self) -> &PollingSupervisor {
        &self.inner.supervisor
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.inner.dispatcher
    }

    // ── Endpoints ────────────────────────────────────────────────

    /// Known endpoints. Safe to iterate while the list is being edited.
    pub fn endpoints(&self) -> Arc<Vec<Endpoint>> {
        self.inner.endpoints.load_full()
    }

    pub fn selected(&self) -> Option<Endpoint> {
        self.inner.selected.load_full().map(|e| (*e).clone())
    }

    pub fn select(&self, endpoint: Endpoint) {
        self.inner.selected.store(Some(Arc::new(endpoint)));
    }

    /// Endpoint last reported as connected.
    pub fn checked(&self) -> Option<Endpoint> {
        self.inner.checked.load_full().map(|e| (*e).clone())
    }

    fn add_endpoint(&self, endpoint: Endpoint) {
        self.inner.endpoints.rcu(|list| {
            let mut next = Vec::clone(list);
            if !next.contains(&endpoint) {
                next.push(endpoint.clone());
            }
            next
        });
    }

    fn remove_endpoint(&self, endpoint: &Endpoint) {
        self.inner.endpoints.rcu(|list| {
            list.iter()
                .filter(|e| *e != endpoint)
                .cloned()
                .collect::<Vec<_>>()
        });
        if self.inner.selected.load().as_deref() == Some(endpoint) {
            self.inner.selected.store(None);
        }
    }

    // ── Event loop ───────────────────────────────────────────────

    /// Sender for host events.
    pub fn sender(&self) -> mpsc::Sender<ControlEvent> {
        self.inner.control_tx.clone()
    }

    /// Queue a host event.
    pub async fn send(&self, event: ControlEvent) -> Result<(), CoreError> {
        self.inner
            .control_tx
            .send(event)
            .await
            .map_err(|_| CoreError::Internal("controller stopped".into()))
    }

    /// Spawn the event loop. Calling it twice is a no-op.
    pub async fn run(&self) {
        let Some(rx) = self.inner.control_rx.lock().await.take() else {
            debug!("controller already running");
            return;
        };
        let connected = self.inner.supervisor.connected();
        let reconnects = self.inner.supervisor.reconnects();
        let handle = tokio::spawn(control_task(self.clone(), rx, connected, reconnects));
        *self.inner.task.lock().await = Some(handle);
    }

    /// Stop the loop and shut the supervisor down.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task.lock().await.take() {
            let _ = handle.await;
        }
        self.inner.supervisor.shutdown().await;
    }

    // ── Connection decisions ─────────────────────────────────────

    /// Connect to the selected endpoint (or the first known one).
    ///
    /// Does nothing while connected; asks the host for a connection
    /// manager when no endpoint is known.
    pub async fn init_connection(&self) {
        if self.inner.supervisor.is_connected() {
            return;
        }

        let endpoints = self.endpoints();
        if endpoints.is_empty() {
            info!("no servers configured");
            self.inner
                .supervisor
                .emit(EngineEvent::ConnectionManagerRequested);
            return;
        }

        let target = match self.selected() {
            Some(selected) => selected,
            None => {
                let Some(first) = endpoints.first() else {
                    return;
                };
                self.select(first.clone());
                first.clone()
            }
        };
        self.inner.supervisor.start(target).await;
    }

    /// Add a torrent now, or after the next successful connect.
    pub async fn add_torrent(&self, torrent: NewTorrent) {
        // Checked under the queue lock so a concurrent drain cannot miss it.
        let mut pending = self.inner.pending_adds.lock().await;
        if self.inner.supervisor.is_connected() {
            self.inner.dispatcher.spawn(Command::Add(torrent));
        } else {
            debug!("queueing torrent until connected");
            pending.push(torrent);
        }
    }

    async fn drain_pending_adds(&self) {
        let pending = std::mem::take(&mut *self.inner.pending_adds.lock().await);
        if pending.is_empty() {
            return;
        }
        info!(count = pending.len(), "submitting queued torrents");
        for torrent in pending {
            self.inner.dispatcher.spawn(Command::Add(torrent));
        }
    }

    async fn reconnect_to(&self, endpoint: Endpoint) {
        info!(endpoint = %endpoint, "switching server");
        self.select(endpoint);
        if !self.inner.supervisor.request_reconnect().await {
            // Nothing to tear down, so no ReconnectAllowed will follow.
            self.init_connection().await;
        }
    }

    async fn retry(&self) {
        self.inner.supervisor.clear_connect_error();
        if let Some(source) = &self.inner.source {
            match source.load() {
                Ok(endpoints) => {
                    for endpoint in endpoints {
                        self.add_endpoint(endpoint);
                    }
                }
                Err(e) => warn!(error = %e, "could not reload endpoints"),
            }
        }
        self.init_connection().await;
    }

    /// Apply one host event. Returns `false` when the loop should end.
    async fn handle_control(&self, event: ControlEvent) -> bool {
        debug!(?event, "control event");
        match event {
            ControlEvent::ReconnectRequested(endpoint) => self.reconnect_to(endpoint).await,
            ControlEvent::ReconnectAllowed => self.init_connection().await,
            ControlEvent::ServerAdded(endpoint) => self.add_endpoint(endpoint),
            ControlEvent::ServerRemoved(endpoint) => self.remove_endpoint(&endpoint),
            ControlEvent::ConnectedServerChanged(endpoint) => {
                self.inner.checked.store(endpoint.map(Arc::new));
            }
            ControlEvent::Retry => self.retry().await,
            ControlEvent::Shutdown => return false,
        }
        true
    }

    async fn on_connected(&self, endpoint: Option<Endpoint>) {
        let connected = endpoint.is_some();
        self.inner.checked.store(endpoint.map(Arc::new));
        if connected {
            self.drain_pending_adds().await;
        }
    }
}

async fn control_task(
    controller: ConnectionController,
    mut control_rx: mpsc::Receiver<ControlEvent>,
    mut connected: watch::Receiver<Option<Endpoint>>,
    mut reconnects: watch::Receiver<u64>,
) {
    let cancel = controller.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = control_rx.recv() => {
                let Some(event) = event else { break };
                if !controller.handle_control(event).await {
                    break;
                }
            }
            changed = connected.changed() => {
                if changed.is_err() {
                    break;
                }
                let endpoint = connected.borrow_and_update().clone();
                controller.on_connected(endpoint).await;
            }
            changed = reconnects.changed() => {
                if changed.is_err() {
                    break;
                }
                controller.init_connection().await;
            }
        }
    }

    controller.inner.supervisor.shutdown().await;
    debug!("controller stopped");
}
