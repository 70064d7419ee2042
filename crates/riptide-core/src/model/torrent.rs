// ── Torrent domain types ──

use std::fmt;

use chrono::{DateTime, Utc};

/// Daemon-side torrent status.
///
/// Codes `0..=6` come from the daemon. [`TorrentStatus::Error`] (`-1`) is
/// never sent by the daemon; classification assigns it to torrents whose
/// trackers all failed their last announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TorrentStatus {
    #[default]
    Stopped,
    CheckWait,
    Checking,
    DownloadWait,
    Downloading,
    SeedWait,
    Seeding,
    Error,
    Unknown(i64),
}

impl TorrentStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => Self::Error,
            0 => Self::Stopped,
            1 => Self::CheckWait,
            2 => Self::Checking,
            3 => Self::DownloadWait,
            4 => Self::Downloading,
            5 => Self::SeedWait,
            6 => Self::Seeding,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Error => -1,
            Self::Stopped => 0,
            Self::CheckWait => 1,
            Self::Checking => 2,
            Self::DownloadWait => 3,
            Self::Downloading => 4,
            Self::SeedWait => 5,
            Self::Seeding => 6,
            Self::Unknown(code) => code,
        }
    }

    /// `CheckWait` or `Checking`.
    pub fn is_checking(self) -> bool {
        matches!(self, Self::CheckWait | Self::Checking)
    }
}

impl fmt::Display for TorrentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::CheckWait => f.write_str("check queued"),
            Self::Checking => f.write_str("checking"),
            Self::DownloadWait => f.write_str("download queued"),
            Self::Downloading => f.write_str("downloading"),
            Self::SeedWait => f.write_str("seed queued"),
            Self::Seeding => f.write_str("seeding"),
            Self::Error => f.write_str("error"),
            Self::Unknown(code) => write!(f, "unknown ({code})"),
        }
    }
}

/// Outcome of the most recent announce to one tracker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerStat {
    pub host: String,
    pub last_announce_succeeded: bool,
    pub last_announce_result: String,
}

/// One file inside a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TorrentFile {
    pub name: String,
    pub length: i64,
    pub bytes_completed: i64,
    /// Only known after a detail fetch.
    pub wanted: Option<bool>,
}

/// A downloadable item managed by the daemon.
///
/// Replaced wholesale on every tick. The only local edits are the
/// display normalization in [`crate::filter`] and optimistic placeholders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Torrent {
    pub id: i64,
    pub name: String,
    pub hash: String,
    pub added: Option<DateTime<Utc>>,
    pub status: TorrentStatus,
    /// Fraction in `0.0..=1.0`.
    pub percent_done: f64,
    pub recheck_progress: f64,
    /// Bytes per second.
    pub rate_download: i64,
    pub rate_upload: i64,
    pub uploaded_ever: i64,
    pub download_dir: String,
    /// Empty when the daemon reports no error.
    pub error_string: String,
    pub trackers: Vec<TrackerStat>,
    pub files: Vec<TorrentFile>,

    // Detail-only fields, filled by a full-field fetch.
    pub total_size: Option<i64>,
    pub eta: Option<i64>,
    pub upload_ratio: Option<f64>,
    pub comment: Option<String>,
    pub magnet_link: Option<String>,
}

impl Torrent {
    /// Minimal stand-in for a torrent the daemon just accepted.
    pub fn placeholder(id: i64, name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hash: hash.into(),
            added: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error_string.is_empty()
    }

    /// `true` if there is at least one tracker and every one failed its last announce.
    pub fn all_trackers_failed(&self) -> bool {
        !self.trackers.is_empty() && self.trackers.iter().all(|t| !t.last_announce_succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_including_unknown() {
        for code in -1..=8 {
            assert_eq!(TorrentStatus::from_code(code).code(), code);
        }
        assert_eq!(TorrentStatus::from_code(9), TorrentStatus::Unknown(9));
    }

    #[test]
    fn tracker_failure_needs_at_least_one_tracker() {
        let mut t = Torrent::placeholder(1, "a", "h");
        assert!(!t.all_trackers_failed());

        t.trackers = vec![TrackerStat::default(), TrackerStat::default()];
        assert!(t.all_trackers_failed());

        t.trackers[1].last_announce_succeeded = true;
        assert!(!t.all_trackers_failed());
    }
}
