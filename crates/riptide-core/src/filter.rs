// ── Torrent classification ──
//
// Pure functions deciding which torrents a view shows and how they are
// displayed. Runs under the table lock on every publish, so nothing here
// touches the network or allocates beyond the output list.

use crate::model::{FolderCategory, StatusCategory, Torrent, TorrentStatus, normalize_path};

/// Marker that turns free-text filter input into a folder predicate.
pub const FOLDER_MARKER: &str = "{p}:";

/// Parsed free-text filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFilter {
    /// Empty input: everything passes.
    None,
    /// `{p}:<path>`: exact match on the normalized download directory.
    Folder(String),
    /// Case-insensitive substring of the torrent name.
    Name(String),
}

impl TextFilter {
    pub fn parse(text: &str) -> Self {
        if let Some(idx) = text.rfind(FOLDER_MARKER) {
            let path = &text[idx + FOLDER_MARKER.len()..];
            return Self::Folder(normalize_path(path));
        }
        let needle = text.trim();
        if needle.is_empty() {
            Self::None
        } else {
            Self::Name(needle.to_lowercase())
        }
    }

    pub fn matches(&self, torrent: &Torrent) -> bool {
        match self {
            Self::None => true,
            Self::Folder(path) => normalize_path(&torrent.download_dir) == *path,
            Self::Name(needle) => torrent.name.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Filter text selecting exactly the torrents of `folder`.
pub fn folder_filter(folder: &FolderCategory) -> String {
    format!("{FOLDER_MARKER}{}", folder.path())
}

/// Select the torrents shown for `category` and `text`, in input order,
/// each passed through [`normalize_for_display`].
pub fn classify<'a>(
    torrents: impl IntoIterator<Item = &'a Torrent>,
    category: StatusCategory,
    text: &str,
) -> Vec<Torrent> {
    let text = TextFilter::parse(text);
    torrents
        .into_iter()
        .filter(|t| category.matches(t) && text.matches(t))
        .map(|t| normalize_for_display(t.clone()))
        .collect()
}

/// Display-only corrections. Never sent back to the daemon.
///
/// Checking torrents show recheck progress. Torrents that are not stopped
/// and whose trackers all failed their last announce show as
/// [`TorrentStatus::Error`].
pub fn normalize_for_display(mut torrent: Torrent) -> Torrent {
    if torrent.status.is_checking() {
        torrent.percent_done = torrent.recheck_progress;
        return torrent;
    }
    if torrent.status == TorrentStatus::Stopped {
        return torrent;
    }
    if torrent.all_trackers_failed() {
        torrent.status = TorrentStatus::Error;
    }
    torrent
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::TrackerStat;

    fn torrent(id: i64, status: i64, down: i64, up: i64) -> Torrent {
        Torrent {
            id,
            name: format!("torrent-{id}"),
            status: TorrentStatus::from_code(status),
            rate_download: down,
            rate_upload: up,
            ..Torrent::default()
        }
    }

    fn ids(list: &[Torrent]) -> Vec<i64> {
        list.iter().map(|t| t.id).collect()
    }

    fn failed_tracker() -> TrackerStat {
        TrackerStat {
            host: "tracker.example".into(),
            last_announce_succeeded: false,
            last_announce_result: "Connection failed".into(),
        }
    }

    #[test]
    fn active_scenario_selects_only_the_transferring_torrent() {
        let set = vec![torrent(1, 4, 10, 0), torrent(2, 0, 0, 0), torrent(3, 6, 0, 0)];
        assert_eq!(ids(&classify(&set, StatusCategory::Active, "")), vec![1]);
    }

    #[test]
    fn all_is_identity_and_keeps_order() {
        let set = vec![torrent(5, 0, 0, 0), torrent(2, 4, 1, 1), torrent(9, 6, 0, 0)];
        assert_eq!(ids(&classify(&set, StatusCategory::All, "")), vec![5, 2, 9]);
    }

    #[test]
    fn folder_marker_uses_last_occurrence() {
        let mut a = torrent(1, 0, 0, 0);
        a.download_dir = "/dl/movies".into();
        let mut b = torrent(2, 0, 0, 0);
        b.download_dir = "/dl/tv/".into();
        let set = vec![a, b];

        let text = "{p}:/dl/movies/{p}:/dl/tv";
        assert_eq!(ids(&classify(&set, StatusCategory::All, text)), vec![2]);
        assert_eq!(
            ids(&classify(&set, StatusCategory::All, "{p}:/dl/movies/")),
            vec![1]
        );
    }

    #[test]
    fn name_filter_is_case_insensitive() {
        let mut a = torrent(1, 0, 0, 0);
        a.name = "Debian 12 netinst".into();
        let set = vec![a, torrent(2, 0, 0, 0)];
        assert_eq!(ids(&classify(&set, StatusCategory::All, "DEBIAN")), vec![1]);
        assert_eq!(TextFilter::parse("   "), TextFilter::None);
    }

    #[test]
    fn folder_filter_round_trips_through_parse() {
        let folder = FolderCategory::new("/dl/music");
        assert_eq!(
            TextFilter::parse(&folder_filter(&folder)),
            TextFilter::Folder("/dl/music/".into())
        );
    }

    #[test]
    fn checking_shows_recheck_progress_even_with_failed_trackers() {
        for status in [1, 2] {
            let mut t = torrent(1, status, 0, 0);
            t.percent_done = 0.9;
            t.recheck_progress = 0.25;
            t.trackers = vec![failed_tracker()];

            let shown = normalize_for_display(t);
            assert_eq!(shown.percent_done, 0.25);
            assert_eq!(shown.status.code(), status);
        }
    }

    #[test]
    fn all_trackers_failed_marks_error() {
        let mut t = torrent(1, 6, 0, 0);
        t.trackers = vec![failed_tracker(), failed_tracker()];
        assert_eq!(normalize_for_display(t.clone()).status, TorrentStatus::Error);

        t.trackers[0].last_announce_succeeded = true;
        assert_eq!(normalize_for_display(t).status, TorrentStatus::Seeding);
    }

    #[test]
    fn stopped_torrents_are_left_alone() {
        let mut t = torrent(1, 0, 0, 0);
        t.trackers = vec![failed_tracker()];
        assert_eq!(normalize_for_display(t).status, TorrentStatus::Stopped);
    }

    #[test]
    fn status_filter_runs_on_daemon_status_not_display_override() {
        let mut t = torrent(1, 6, 0, 0);
        t.trackers = vec![failed_tracker()];
        let shown = classify(&[t], StatusCategory::Ended, "");
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].status, TorrentStatus::Error);
    }
}
