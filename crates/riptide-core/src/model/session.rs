// ── Session-level daemon data ──

/// Daemon identity captured when a session opens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionInfo {
    pub version: String,
    pub rpc_version: String,
    /// Alternative ("slow mode") speed limits active.
    pub alt_speed_enabled: bool,
    pub download_dir: Option<String>,
}

/// Transfer statistics fetched on every tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Bytes per second, summed over all torrents.
    pub download_speed: i64,
    pub upload_speed: i64,
    /// Cumulative totals across daemon restarts.
    pub uploaded_bytes: u64,
    pub downloaded_bytes: u64,
    /// Seconds active in the current daemon session.
    pub seconds_active: u64,
}
