// ── API-to-domain type conversions ──
//
// Bridges raw `riptide_api::models` response types into canonical
// `riptide_core::model` types. Missing projection fields fall back to
// neutral defaults so classification never has to deal with `None`.

use chrono::{DateTime, Utc};

use riptide_api::models as wire;

use crate::model::{SessionInfo, SessionStats, Torrent, TorrentFile, TorrentStatus, TrackerStat};

/// Convert an optional epoch-seconds timestamp to `DateTime<Utc>`.
/// The daemon uses `0` for "never".
fn epoch_to_datetime(epoch: Option<i64>) -> Option<DateTime<Utc>> {
    epoch
        .filter(|ts| *ts > 0)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
}

impl From<wire::SessionInfo> for SessionInfo {
    fn from(info: wire::SessionInfo) -> Self {
        Self {
            version: info.version,
            rpc_version: info.rpc_version.to_string(),
            alt_speed_enabled: info.alt_speed_enabled,
            download_dir: info.download_dir,
        }
    }
}

impl From<wire::SessionStats> for SessionStats {
    fn from(stats: wire::SessionStats) -> Self {
        Self {
            download_speed: stats.download_speed,
            upload_speed: stats.upload_speed,
            uploaded_bytes: stats.cumulative_stats.uploaded_bytes,
            downloaded_bytes: stats.cumulative_stats.downloaded_bytes,
            seconds_active: stats.current_stats.seconds_active,
        }
    }
}

impl From<wire::TrackerStat> for TrackerStat {
    fn from(t: wire::TrackerStat) -> Self {
        Self {
            host: t.host,
            last_announce_succeeded: t.last_announce_succeeded,
            last_announce_result: t.last_announce_result,
        }
    }
}

impl From<wire::Torrent> for Torrent {
    fn from(t: wire::Torrent) -> Self {
        let wanted: Vec<bool> = t
            .file_stats
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.wanted)
            .collect();

        let files = t
            .files
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(idx, f)| TorrentFile {
                name: f.name,
                length: f.length,
                bytes_completed: f.bytes_completed,
                wanted: wanted.get(idx).copied(),
            })
            .collect();

        Self {
            id: t.id,
            name: t.name.unwrap_or_default(),
            hash: t.hash_string.unwrap_or_default(),
            added: epoch_to_datetime(t.added_date),
            status: TorrentStatus::from_code(t.status.unwrap_or_default()),
            percent_done: t.percent_done.unwrap_or_default(),
            recheck_progress: t.recheck_progress.unwrap_or_default(),
            rate_download: t.rate_download.unwrap_or_default(),
            rate_upload: t.rate_upload.unwrap_or_default(),
            uploaded_ever: t.uploaded_ever.unwrap_or_default(),
            download_dir: t.download_dir.unwrap_or_default(),
            error_string: t.error_string.unwrap_or_default(),
            trackers: t
                .tracker_stats
                .unwrap_or_default()
                .into_iter()
                .map(TrackerStat::from)
                .collect(),
            files,
            total_size: t.total_size,
            eta: t.eta,
            upload_ratio: t.upload_ratio,
            comment: t.comment,
            magnet_link: t.magnet_link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_take_cumulative_totals_and_current_uptime() {
        let raw = wire::SessionStats {
            download_speed: 100,
            upload_speed: 5,
            cumulative_stats: wire::TransferStats {
                uploaded_bytes: 10,
                downloaded_bytes: 20,
                seconds_active: 9_999,
                ..Default::default()
            },
            current_stats: wire::TransferStats {
                seconds_active: 42,
                ..Default::default()
            },
            ..Default::default()
        };

        let stats = SessionStats::from(raw);
        assert_eq!(stats.uploaded_bytes, 10);
        assert_eq!(stats.downloaded_bytes, 20);
        assert_eq!(stats.seconds_active, 42);
    }

    #[test]
    fn file_stats_merge_into_files_by_index() {
        let raw = wire::Torrent {
            id: 3,
            status: Some(6),
            added_date: Some(0),
            files: Some(vec![
                wire::TorrentFile {
                    name: "a".into(),
                    ..Default::default()
                },
                wire::TorrentFile {
                    name: "b".into(),
                    ..Default::default()
                },
            ]),
            file_stats: Some(vec![wire::FileStat {
                wanted: false,
                ..Default::default()
            }]),
            ..Default::default()
        };

        let t = Torrent::from(raw);
        assert_eq!(t.status, TorrentStatus::Seeding);
        assert!(t.added.is_none());
        assert_eq!(t.files[0].wanted, Some(false));
        assert_eq!(t.files[1].wanted, None);
    }
}
