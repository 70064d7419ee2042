//! Terminal password prompt for profiles with `ask_for_password`.

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::warn;

use riptide_core::{CredentialPrompt, Endpoint};

/// Reads a password from the controlling terminal without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

#[async_trait]
impl CredentialPrompt for TerminalPrompt {
    async fn prompt(&self, endpoint: &Endpoint) -> Option<SecretString> {
        let label = format!("Password for {endpoint}: ");
        let read = tokio::task::spawn_blocking(move || rpassword::prompt_password(label)).await;
        match read {
            Ok(Ok(password)) if !password.is_empty() => Some(SecretString::from(password)),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!(error = %e, "could not read password");
                None
            }
            Err(e) => {
                warn!(error = %e, "password prompt task failed");
                None
            }
        }
    }
}
