// Session-level RPC methods: session-get, session-stats, session-set.

use tokio_util::sync::CancellationToken;

use crate::client::TransmissionClient;
use crate::error::Error;
use crate::models::{Empty, SessionInfo, SessionSetAltSpeed, SessionStats};

impl TransmissionClient {
    /// Fetch daemon version information and session settings.
    pub async fn session_get(&self, cancel: &CancellationToken) -> Result<SessionInfo, Error> {
        self.call::<Empty, _>("session-get", None, cancel).await
    }

    /// Fetch transfer speeds and cumulative/current counters.
    pub async fn session_stats(&self, cancel: &CancellationToken) -> Result<SessionStats, Error> {
        self.call::<Empty, _>("session-stats", None, cancel).await
    }

    /// Turn the alternative ("turtle") speed limits on or off.
    pub async fn session_set_alt_speed(
        &self,
        enabled: bool,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let args = SessionSetAltSpeed {
            alt_speed_enabled: enabled,
        };
        let _: Empty = self.call("session-set", Some(&args), cancel).await?;
        Ok(())
    }
}
