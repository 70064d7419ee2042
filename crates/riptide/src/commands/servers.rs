//! `riptide servers`: list configured server profiles.

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let store = super::open_store(global)?;
    let config = store.config();
    let endpoints = config.endpoints();
    if endpoints.is_empty() {
        return Err(CliError::NoServers {
            path: store.path().display().to_string(),
        });
    }

    let rendered = output::render_servers(
        global.output,
        &endpoints,
        config.default_server.as_deref(),
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}
