// ── Command dispatch ──
//
// Runs user mutations against the active session. Each command is
// guarded, logged, and folded back into the table when the daemon
// confirms it. Failures become outcomes and events, never panics or
// session teardowns.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::events::EngineEvent;
use crate::gateway::Projection;
use crate::guard::{self, Outcome};
use crate::model::Torrent;
use crate::supervisor::{PollingSupervisor, Session};

use super::{Command, CommandOutcome};

/// Routes [`Command`]s to the session owned by a [`PollingSupervisor`].
#[derive(Clone)]
pub struct CommandDispatcher {
    supervisor: PollingSupervisor,
}

impl CommandDispatcher {
    pub fn new(supervisor: PollingSupervisor) -> Self {
        Self { supervisor }
    }

    /// Run `command` as an independent task. The tick loop neither waits
    /// for it nor blocks it.
    pub fn spawn(&self, command: Command) -> JoinHandle<CommandOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.execute(command).await })
    }

    /// Run `command` to completion.
    pub async fn execute(&self, command: Command) -> CommandOutcome {
        let Some(session) = self.supervisor.session() else {
            debug!(command = command.name(), "rejected: not connected");
            return CommandOutcome::NotConnected;
        };

        let name = command.name();
        debug!(command = name, endpoint = %session.endpoint(), "dispatching");

        let outcome = self.route(&session, command).await;
        match &outcome {
            CommandOutcome::Failed(message) => {
                warn!(command = name, error = %message, "command failed");
                self.supervisor.emit(EngineEvent::CommandFailed {
                    command: name,
                    message: message.clone(),
                });
            }
            CommandOutcome::Cancelled => debug!(command = name, "command cancelled"),
            _ => {}
        }
        outcome
    }

    /// Fetch every field of one torrent, bypassing the table.
    pub async fn details(&self, id: i64) -> Result<Torrent, CoreError> {
        let session = self.supervisor.session().ok_or(CoreError::NotConnected)?;
        let result = session
            .rpc()
            .list_torrents(
                Projection::Full,
                Some(std::slice::from_ref(&id)),
                session.cancel_token(),
            )
            .await;
        guard::classify(result, session.endpoint())
            .into_result()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(CoreError::TorrentNotFound { id })
    }

    async fn route(&self, session: &Arc<Session>, command: Command) -> CommandOutcome {
        let rpc = session.rpc();
        let cancel = session.cancel_token();
        let endpoint = session.endpoint();

        match command {
            Command::Start { ids } => {
                settle(guard::classify(rpc.start(&ids, false, cancel).await, endpoint))
            }
            Command::StartNow { ids } => {
                settle(guard::classify(rpc.start(&ids, true, cancel).await, endpoint))
            }
            Command::Stop { ids } => settle(guard::classify(rpc.stop(&ids, cancel).await, endpoint)),
            Command::Verify { ids } => {
                settle(guard::classify(rpc.verify(&ids, cancel).await, endpoint))
            }
            Command::Reannounce { ids } => {
                settle(guard::classify(rpc.reannounce(&ids, cancel).await, endpoint))
            }
            Command::QueueMove { ids, direction } => settle(guard::classify(
                rpc.queue_move(direction, &ids, cancel).await,
                endpoint,
            )),
            Command::Rename { id, path, name } => settle(guard::classify(
                rpc.rename(id, &path, &name, cancel).await,
                endpoint,
            )),
            Command::Relocate {
                ids,
                location,
                move_data,
            } => self.relocate(session, &ids, &location, move_data).await,
            Command::Remove { ids, delete_data } => {
                let outcome = guard::classify(rpc.remove(&ids, delete_data, cancel).await, endpoint);
                if outcome.is_ok() {
                    info!(ids = ?ids, "removed torrents");
                    let publication = self.supervisor.table().remove_ids(&ids).await;
                    self.supervisor.announce(publication);
                }
                settle(outcome)
            }
            Command::Add(torrent) => match guard::classify(rpc.add(&torrent, cancel).await, endpoint) {
                Outcome::Ok(added) => {
                    info!(id = added.id, name = %added.name, "added torrent");
                    let placeholder =
                        Torrent::placeholder(added.id, added.name.clone(), added.hash.clone());
                    let publication = self.supervisor.table().insert_placeholder(placeholder).await;
                    self.supervisor.announce(publication);
                    CommandOutcome::Added(added)
                }
                other => settle(other.map(|_| ())),
            },
            Command::SetFiles {
                id,
                wanted,
                unwanted,
            } => settle(guard::classify(
                rpc.set_files(id, &wanted, &unwanted, cancel).await,
                endpoint,
            )),
            Command::SetAltSpeed { enabled } => {
                let outcome = guard::classify(rpc.set_alt_speed(enabled, cancel).await, endpoint);
                if outcome.is_ok() {
                    let publication = self.supervisor.table().set_alt_speed(enabled).await;
                    self.supervisor.announce(publication);
                }
                settle(outcome)
            }
        }
    }

    /// `torrent-set-location` until the daemon accepts it, the attempt
    /// bound is reached, or the session is cancelled.
    async fn relocate(
        &self,
        session: &Session,
        ids: &[i64],
        location: &str,
        move_data: bool,
    ) -> CommandOutcome {
        let config = self.supervisor.config();
        let cancel = session.cancel_token();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = session
                .rpc()
                .set_location(ids, location, move_data, cancel)
                .await;
            let outcome = guard::classify(result, session.endpoint());

            let message = match outcome {
                Outcome::Ok(()) => {
                    info!(ids = ?ids, location, attempt, "relocated torrents");
                    return CommandOutcome::Done;
                }
                Outcome::Cancelled => return CommandOutcome::Cancelled,
                Outcome::Transport(failure) => failure.message,
                Outcome::Daemon(message) => message,
            };

            if attempt >= config.relocate_max_attempts {
                return CommandOutcome::Failed(format!(
                    "relocation not accepted after {attempt} attempts: {message}"
                ));
            }
            debug!(attempt, error = %message, "relocation not accepted yet, retrying");

            tokio::select! {
                biased;
                () = cancel.cancelled() => return CommandOutcome::Cancelled,
                () = tokio::time::sleep(config.relocate_retry) => {}
            }
        }
    }
}

fn settle(outcome: Outcome<()>) -> CommandOutcome {
    match outcome {
        Outcome::Ok(()) => CommandOutcome::Done,
        Outcome::Cancelled => CommandOutcome::Cancelled,
        Outcome::Transport(failure) => CommandOutcome::Failed(failure.message),
        Outcome::Daemon(message) => CommandOutcome::Failed(message),
    }
}
