//! `riptide watch`: keep a session open and print every update.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use riptide_core::{ConnectionController, EndpointSource, EngineEvent, FolderDelta, Snapshot};

use crate::cli::{GlobalOpts, OutputFormat, ViewArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ViewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = super::open_store(global)?;
    let config = store.config();
    let supervisor = super::build_supervisor(&store, &config, global.server.as_deref());
    let controller = ConnectionController::with_source(
        supervisor.clone(),
        Arc::clone(&store) as Arc<dyn EndpointSource>,
    );
    if global.server.is_some() {
        controller.select(super::select_endpoint(&config, global, &store)?);
    }

    supervisor.set_category(args.category.into()).await;
    if let Some(filter) = args.filter {
        supervisor.set_filter(filter).await;
    }

    let mut events = supervisor.events();
    let mut snapshots = supervisor.subscribe();
    controller.run().await;
    controller.init_connection().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut shown = 0;

    let result = loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                info!("interrupted");
                break signal.map_err(CliError::from);
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Err(e) = report(event, &store.path().display().to_string()) {
                        break Err(e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break Ok(()),
            },
            snap = snapshots.changed() => match snap {
                Some(snap) => {
                    // Skip the intermediate publishes of a connect.
                    if snap.stats.is_some() && snap.generation > shown {
                        shown = snap.generation;
                        print_snapshot(&snap, global);
                    }
                }
                None => break Ok(()),
            },
        }
    };

    controller.shutdown().await;
    result
}

fn report(event: EngineEvent, config_path: &str) -> Result<(), CliError> {
    match event {
        EngineEvent::ConnectedServerChanged(Some(endpoint)) => {
            eprintln!("connected to {endpoint}");
        }
        EngineEvent::ConnectedServerChanged(None) => eprintln!("disconnected"),
        EngineEvent::Folder(FolderDelta::Added(folder)) => eprintln!("+ {}", folder.title()),
        EngineEvent::Folder(FolderDelta::Removed(folder)) => eprintln!("- {}", folder.title()),
        EngineEvent::ConnectFailed { endpoint, failure } => {
            return Err(CliError::connect_failed(&endpoint.name, &failure));
        }
        EngineEvent::Faulted { endpoint, failure } => {
            return Err(CliError::ConnectionLost {
                server: endpoint.name,
                message: failure.to_string(),
            });
        }
        EngineEvent::ConnectionManagerRequested => {
            return Err(CliError::NoServers {
                path: config_path.to_owned(),
            });
        }
        EngineEvent::CommandFailed { command, message } => {
            eprintln!("{command} failed: {message}");
        }
        EngineEvent::Folder(FolderDelta::Updated(_))
        | EngineEvent::StatusLine(_)
        | EngineEvent::ReconnectAllowed => {}
    }
    Ok(())
}

fn print_snapshot(snap: &Snapshot, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    if matches!(global.output, OutputFormat::Table) {
        println!("{}", output::render_summary(snap));
        let folders = output::render_folders(&snap.folders);
        if !folders.is_empty() {
            println!("{folders}");
        }
    }
    output::print_output(&output::render_torrents(global.output, &snap.torrents), false);
}
