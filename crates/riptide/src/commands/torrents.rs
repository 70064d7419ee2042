//! One-shot torrent commands: connect, run, disconnect.

use riptide_core::{
    Command as CoreCommand, CommandDispatcher, CommandOutcome, CoreError, NewTorrent,
};

use crate::cli::{AddArgs, Command, GlobalOpts, Toggle, ViewArgs};
use crate::error::CliError;
use crate::output;

use super::Engine;

pub async fn handle(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let engine = super::connect(global).await?;
    let result = run(&engine, command, global).await;
    engine.supervisor.shutdown().await;
    result
}

async fn run(engine: &Engine, command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let dispatcher = CommandDispatcher::new(engine.supervisor.clone());

    let core = match command {
        Command::List(args) => return list(engine, args, global).await,
        Command::Info { id } => {
            let torrent = dispatcher.details(id).await?;
            output::print_output(&output::render_detail(&torrent), global.quiet);
            return Ok(());
        }
        Command::Add(args) => return add(&dispatcher, args, global).await,
        Command::Start { ids, now: false } => CoreCommand::Start { ids },
        Command::Start { ids, now: true } => CoreCommand::StartNow { ids },
        Command::Stop { ids } => CoreCommand::Stop { ids },
        Command::Verify { ids } => CoreCommand::Verify { ids },
        Command::Reannounce { ids } => CoreCommand::Reannounce { ids },
        Command::Queue { direction, ids } => CoreCommand::QueueMove {
            ids,
            direction: direction.into(),
        },
        Command::Rename { id, name, path } => {
            let path = match path {
                Some(path) => path,
                None => dispatcher.details(id).await?.name,
            };
            CoreCommand::Rename { id, path, name }
        }
        Command::Move { ids, to, no_move } => CoreCommand::Relocate {
            ids,
            location: to,
            move_data: !no_move,
        },
        Command::Remove { ids, delete_data } => CoreCommand::Remove { ids, delete_data },
        Command::Files { id, want, skip } => {
            if want.is_empty() && skip.is_empty() {
                return Err(CliError::Validation {
                    field: "files".into(),
                    reason: "pass --want and/or --skip file indices".into(),
                });
            }
            CoreCommand::SetFiles {
                id,
                wanted: want,
                unwanted: skip,
            }
        }
        Command::AltSpeed { state } => CoreCommand::SetAltSpeed {
            enabled: matches!(state, Toggle::On),
        },
        Command::Watch(_) | Command::Servers => {
            return Err(CliError::Validation {
                field: "command".into(),
                reason: "not a torrent command".into(),
            });
        }
    };

    let name = core.name();
    finish(dispatcher.execute(core).await, name, global)
}

async fn list(engine: &Engine, args: ViewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    engine.supervisor.set_category(args.category.into()).await;
    if let Some(filter) = args.filter {
        engine.supervisor.set_filter(filter).await;
    }
    let snap = super::first_tick(engine).await?;

    if matches!(global.output, crate::cli::OutputFormat::Table) && !global.quiet {
        println!("{}", output::render_summary(&snap));
    }
    output::print_output(
        &output::render_torrents(global.output, &snap.torrents),
        global.quiet,
    );
    Ok(())
}

async fn add(
    dispatcher: &CommandDispatcher,
    args: AddArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    for source in args.sources {
        let mut torrent = if is_link(&source) {
            NewTorrent::link(source)
        } else {
            NewTorrent::metainfo(tokio::fs::read(&source).await?)
        };
        if let Some(dir) = &args.dir {
            torrent = torrent.into_dir(dir.clone());
        }
        let torrent = torrent.paused(args.paused);
        finish(
            dispatcher.execute(CoreCommand::Add(torrent)).await,
            "add",
            global,
        )?;
    }
    Ok(())
}

fn is_link(source: &str) -> bool {
    ["magnet:", "http://", "https://"]
        .iter()
        .any(|prefix| source.starts_with(prefix))
}

fn finish(outcome: CommandOutcome, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    match outcome {
        CommandOutcome::Done => {
            if !global.quiet {
                eprintln!("{name}: done");
            }
            Ok(())
        }
        CommandOutcome::Added(added) => {
            output::print_output(&format!("{}\t{}", added.id, added.name), global.quiet);
            Ok(())
        }
        CommandOutcome::NotConnected => Err(CoreError::NotConnected.into()),
        CommandOutcome::Cancelled => Err(CoreError::Cancelled.into()),
        CommandOutcome::Failed(message) => Err(CliError::CommandFailed {
            command: name.into(),
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_recognized() {
        assert!(is_link("magnet:?xt=urn:btih:abc"));
        assert!(is_link("https://example.com/a.torrent"));
        assert!(!is_link("./a.torrent"));
    }
}
