// ── Engine tuning ──
//
// Timing knobs for the polling loop and command retries. Built by the
// host (usually from riptide-config); the core never reads files.

use std::time::Duration;

/// Runtime configuration for a [`PollingSupervisor`](crate::PollingSupervisor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Delay between the end of one tick's work and the start of the next.
    pub poll_interval: Duration,
    /// Pause between `torrent-set-location` attempts.
    pub relocate_retry: Duration,
    /// Upper bound on relocation attempts before the command is reported failed.
    pub relocate_max_attempts: u32,
    /// How long a tick stage may run before hosts should show a busy indicator.
    pub busy_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5000),
            relocate_retry: Duration::from_millis(500),
            relocate_max_attempts: 120,
            busy_grace: Duration::from_secs(2),
        }
    }
}
