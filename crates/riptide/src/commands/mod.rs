//! Command handlers and the engine setup they share.

pub mod servers;
pub mod torrents;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use riptide_config::{Config, ConfigError, ProfileStore};
use riptide_core::{
    ConnectionState, CoreError, Endpoint, PollingSupervisor, SecretResolver, Snapshot,
    TransmissionGateway,
};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::prompt::TerminalPrompt;

/// Route a parsed command to its handler.
pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match command {
        Command::Servers => servers::handle(global),
        Command::Watch(args) => watch::handle(args, global).await,
        other => torrents::handle(other, global).await,
    }
}

// ── Engine setup ────────────────────────────────────────────────────

/// A supervisor connected to the selected server.
pub struct Engine {
    pub supervisor: PollingSupervisor,
    pub endpoint: Endpoint,
    pub config: Config,
}

pub fn open_store(global: &GlobalOpts) -> Result<Arc<ProfileStore>, CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(riptide_config::config_path);
    Ok(Arc::new(ProfileStore::open(path)?))
}

/// The `--server` profile, or the default/first configured one.
pub fn select_endpoint(
    config: &Config,
    global: &GlobalOpts,
    store: &ProfileStore,
) -> Result<Endpoint, CliError> {
    if let Some(name) = &global.server {
        return config.endpoint(name).map_err(|e| match e {
            ConfigError::UnknownServer { name } => CliError::ServerNotFound {
                name,
                available: config.server_names().join(", "),
            },
            other => other.into(),
        });
    }
    config
        .endpoints()
        .into_iter()
        .next()
        .ok_or_else(|| CliError::NoServers {
            path: store.path().display().to_string(),
        })
}

pub fn build_supervisor(
    store: &Arc<ProfileStore>,
    config: &Config,
    server: Option<&str>,
) -> PollingSupervisor {
    let gateway = TransmissionGateway::new(config.transport_config(server));
    PollingSupervisor::new(
        Arc::new(gateway),
        Arc::new(TerminalPrompt),
        Arc::clone(store) as Arc<dyn SecretResolver>,
        config.engine_config(),
    )
}

/// Connect to the selected server and wait until the session is up.
pub async fn connect(global: &GlobalOpts) -> Result<Engine, CliError> {
    let store = open_store(global)?;
    let config = store.config();
    let endpoint = select_endpoint(&config, global, &store)?;
    let supervisor = build_supervisor(&store, &config, Some(&endpoint.name));

    supervisor.start(endpoint.clone()).await;
    wait_connected(&supervisor, &endpoint).await?;
    debug!(endpoint = %endpoint, "session ready");

    Ok(Engine {
        supervisor,
        endpoint,
        config,
    })
}

async fn wait_connected(
    supervisor: &PollingSupervisor,
    endpoint: &Endpoint,
) -> Result<(), CliError> {
    let mut connected = supervisor.connected();
    let mut state = supervisor.state();

    loop {
        if connected.borrow_and_update().is_some() {
            return Ok(());
        }
        if *state.borrow_and_update() == ConnectionState::Idle {
            return Err(settled_idle(supervisor, endpoint));
        }
        let changed = tokio::select! {
            changed = connected.changed() => changed,
            changed = state.changed() => changed,
        };
        if changed.is_err() {
            return Err(CoreError::NotConnected.into());
        }
    }
}

/// The session task ended before we saw it connect. Work out why.
fn settled_idle(supervisor: &PollingSupervisor, endpoint: &Endpoint) -> CliError {
    match supervisor.last_failure() {
        Some(failure) if supervisor.connect_error() => {
            CliError::connect_failed(&endpoint.name, &failure)
        }
        Some(failure) => CliError::ConnectionLost {
            server: endpoint.name.clone(),
            message: failure.to_string(),
        },
        None if supervisor.connect_error() => CliError::PromptCancelled {
            server: endpoint.name.clone(),
        },
        None => CoreError::NotConnected.into(),
    }
}

/// Wait for the first tick's snapshot.
pub async fn first_tick(engine: &Engine) -> Result<Arc<Snapshot>, CliError> {
    let mut stream = engine.supervisor.subscribe();
    let limit = Duration::from_secs(engine.config.engine.timeout_secs.saturating_mul(2));

    let wait = async {
        loop {
            if stream.current().stats.is_some() {
                return Ok(Arc::clone(stream.current()));
            }
            if !engine.supervisor.is_connected() {
                return Err(CliError::ConnectionLost {
                    server: engine.endpoint.name.clone(),
                    message: engine.supervisor.last_error().unwrap_or_default(),
                });
            }
            if stream.changed().await.is_none() {
                return Err(CoreError::NotConnected.into());
            }
        }
    };

    tokio::time::timeout(limit, wait)
        .await
        .map_err(|_| CliError::Timeout {
            server: engine.endpoint.name.clone(),
        })?
}
