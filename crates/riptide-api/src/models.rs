// Transmission RPC wire types
//
// Request/response envelope plus the payloads of the methods riptide uses.
// Field names follow the daemon exactly: torrent fields are camelCase,
// session fields are kebab-case. Every torrent field is optional because
// `torrent-get` only returns the fields that were asked for.

use serde::{Deserialize, Serialize};

// ── Envelope ────────────────────────────────────────────────────────

/// Outgoing RPC request: `{"method", "arguments", "tag"}`.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, A: Serialize> {
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<&'a A>,
    pub tag: u64,
}

/// Incoming RPC response. `result` is `"success"` or a human-readable error.
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: String,
    pub arguments: Option<T>,
    #[serde(default)]
    pub tag: Option<u64>,
}

/// Placeholder for methods whose response carries no useful arguments.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Empty {}

// ── Session ─────────────────────────────────────────────────────────

/// `session-get` response (subset).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub rpc_version: i64,
    #[serde(default)]
    pub rpc_version_minimum: Option<i64>,
    #[serde(default)]
    pub alt_speed_enabled: bool,
    #[serde(default)]
    pub download_dir: Option<String>,
}

/// `session-set` request for the alternative speed limits.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionSetAltSpeed {
    pub alt_speed_enabled: bool,
}

/// `session-stats` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    #[serde(default)]
    pub active_torrent_count: i64,
    #[serde(default)]
    pub paused_torrent_count: i64,
    #[serde(default)]
    pub torrent_count: i64,
    #[serde(default)]
    pub download_speed: i64,
    #[serde(default)]
    pub upload_speed: i64,
    #[serde(default, rename = "cumulative-stats")]
    pub cumulative_stats: TransferStats,
    #[serde(default, rename = "current-stats")]
    pub current_stats: TransferStats,
}

/// Transfer counters inside `session-stats`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStats {
    #[serde(default)]
    pub uploaded_bytes: u64,
    #[serde(default)]
    pub downloaded_bytes: u64,
    #[serde(default)]
    pub files_added: u64,
    #[serde(default)]
    pub session_count: u64,
    #[serde(default)]
    pub seconds_active: u64,
}

// ── Torrents ────────────────────────────────────────────────────────

/// `torrent-get` request.
#[derive(Debug, Serialize)]
pub struct TorrentGetRequest<'a> {
    pub fields: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<&'a [i64]>,
}

/// `torrent-get` response.
#[derive(Debug, Default, Deserialize)]
pub struct TorrentList {
    #[serde(default)]
    pub torrents: Vec<Torrent>,
}

/// One torrent as returned by `torrent-get`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Torrent {
    pub id: i64,
    pub name: Option<String>,
    pub hash_string: Option<String>,
    pub added_date: Option<i64>,
    pub done_date: Option<i64>,
    pub status: Option<i64>,
    pub percent_done: Option<f64>,
    pub recheck_progress: Option<f64>,
    pub rate_download: Option<i64>,
    pub rate_upload: Option<i64>,
    pub uploaded_ever: Option<i64>,
    pub downloaded_ever: Option<i64>,
    pub total_size: Option<i64>,
    pub size_when_done: Option<i64>,
    pub left_until_done: Option<i64>,
    pub upload_ratio: Option<f64>,
    pub eta: Option<i64>,
    pub queue_position: Option<i64>,
    pub peers_connected: Option<i64>,
    pub download_dir: Option<String>,
    pub error: Option<i64>,
    pub error_string: Option<String>,
    pub comment: Option<String>,
    pub creator: Option<String>,
    pub is_private: Option<bool>,
    pub magnet_link: Option<String>,
    pub tracker_stats: Option<Vec<TrackerStat>>,
    pub files: Option<Vec<TorrentFile>>,
    pub file_stats: Option<Vec<FileStat>>,
}

/// Per-tracker announce outcome.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerStat {
    pub id: i64,
    pub host: String,
    pub announce: String,
    pub tier: i64,
    pub has_announced: bool,
    pub last_announce_succeeded: bool,
    pub last_announce_result: String,
    pub last_announce_time: i64,
    pub seeder_count: i64,
    pub leecher_count: i64,
}

/// One file inside a torrent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TorrentFile {
    pub name: String,
    pub length: i64,
    pub bytes_completed: i64,
}

/// Per-file wanted/priority state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileStat {
    pub bytes_completed: i64,
    pub wanted: bool,
    pub priority: i64,
}

/// Request body for the methods that only take `ids`.
#[derive(Debug, Serialize)]
pub struct IdsRequest<'a> {
    pub ids: &'a [i64],
}

/// `torrent-rename-path` request.
#[derive(Debug, Serialize)]
pub struct RenamePathRequest<'a> {
    pub ids: [i64; 1],
    pub path: &'a str,
    pub name: &'a str,
}

/// `torrent-set-location` request.
#[derive(Debug, Serialize)]
pub struct SetLocationRequest<'a> {
    pub ids: &'a [i64],
    pub location: &'a str,
    #[serde(rename = "move")]
    pub move_data: bool,
}

/// `torrent-remove` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoveRequest<'a> {
    pub ids: &'a [i64],
    pub delete_local_data: bool,
}

/// `torrent-set` request restricted to file selection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SetFilesRequest<'a> {
    pub ids: &'a [i64],
    #[serde(skip_serializing_if = "no_indices")]
    pub files_wanted: &'a [i64],
    #[serde(skip_serializing_if = "no_indices")]
    pub files_unwanted: &'a [i64],
}

#[allow(clippy::trivially_copy_pass_by_ref, clippy::ref_option_ref)]
fn no_indices(indices: &&[i64]) -> bool {
    indices.is_empty()
}

/// `torrent-add` request. Exactly one of `filename` / `metainfo` is set.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Base64-encoded `.torrent` content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metainfo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<String>,
    pub paused: bool,
}

/// `torrent-add` response: either a new torrent or an existing duplicate.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddResponse {
    pub torrent_added: Option<AddedTorrent>,
    pub torrent_duplicate: Option<AddedTorrent>,
}

/// Identity of an added torrent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedTorrent {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hash_string: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn torrent_tolerates_partial_projection() {
        let t: Torrent = serde_json::from_value(json!({
            "id": 7,
            "name": "debian.iso",
            "status": 4,
            "trackerStats": [{ "host": "tracker", "lastAnnounceSucceeded": false }]
        }))
        .unwrap();

        assert_eq!(t.id, 7);
        assert_eq!(t.status, Some(4));
        assert!(t.download_dir.is_none());
        let trackers = t.tracker_stats.unwrap();
        assert_eq!(trackers.len(), 1);
        assert!(!trackers[0].last_announce_succeeded);
    }

    #[test]
    fn session_stats_uses_mixed_case_keys() {
        let s: SessionStats = serde_json::from_value(json!({
            "downloadSpeed": 2048,
            "uploadSpeed": 10,
            "cumulative-stats": { "uploadedBytes": 5, "downloadedBytes": 6, "secondsActive": 100 },
            "current-stats": { "uploadedBytes": 1, "downloadedBytes": 2, "secondsActive": 30 }
        }))
        .unwrap();

        assert_eq!(s.download_speed, 2048);
        assert_eq!(s.cumulative_stats.downloaded_bytes, 6);
        assert_eq!(s.current_stats.seconds_active, 30);
    }

    #[test]
    fn set_files_skips_empty_lists() {
        let body = serde_json::to_value(SetFilesRequest {
            ids: &[3],
            files_wanted: &[0, 1],
            files_unwanted: &[],
        })
        .unwrap();
        assert_eq!(body, json!({ "ids": [3], "files-wanted": [0, 1] }));
    }
}
