// ── Entity table ──
//
// The single synchronized home of the unfiltered torrent set. Every
// writer (tick loop, optimistic command edits, view-filter changes)
// goes through one locked reconcile-and-publish step; readers take the
// published `Arc<Snapshot>` and never see a half-applied update.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, watch};

use crate::filter;
use crate::format;
use crate::model::{
    FolderCategory, SessionInfo, SessionStats, StatusCategory, StatusCounts, Torrent,
};
use crate::stream::SnapshotStream;

use super::folders::{FolderDelta, FolderSet};

/// The reconciled, read-only view produced by one publish.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Bumped on every publish.
    pub generation: u64,
    /// Filtered torrents in daemon order, display-normalized.
    pub torrents: Vec<Torrent>,
    /// Folder categories over the unfiltered set.
    pub folders: Vec<Arc<FolderCategory>>,
    /// Counts over the unfiltered set.
    pub status_counts: StatusCounts,
    pub category: StatusCategory,
    pub filter: String,
    pub info: Option<SessionInfo>,
    pub stats: Option<SessionStats>,
    pub status_line: String,
    /// `"D: <speed>"`.
    pub download_speed: String,
    /// `"U: <speed>"`.
    pub upload_speed: String,
}

impl Snapshot {
    pub fn torrent(&self, id: i64) -> Option<&Torrent> {
        self.torrents.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.torrent(id).is_some()
    }
}

/// What one publish changed, for the event feed.
#[derive(Debug, Default)]
pub struct Publication {
    pub folder_deltas: Vec<FolderDelta>,
    /// Set when the status line text changed.
    pub status_line: Option<String>,
}

struct TableState {
    torrents: IndexMap<i64, Torrent>,
    category: StatusCategory,
    filter: String,
    folders: FolderSet,
    info: Option<SessionInfo>,
    stats: Option<SessionStats>,
    generation: u64,
    status_line: String,
}

/// Locked torrent table with a `watch`-published snapshot.
pub struct EntityTable {
    state: Mutex<TableState>,
    snapshot: watch::Sender<Arc<Snapshot>>,
}

impl Default for EntityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityTable {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            state: Mutex::new(TableState {
                torrents: IndexMap::new(),
                category: StatusCategory::All,
                filter: String::new(),
                folders: FolderSet::new(),
                info: None,
                stats: None,
                generation: 0,
                status_line: String::new(),
            }),
            snapshot,
        }
    }

    // ── Readers ──────────────────────────────────────────────────

    /// Latest published snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.snapshot.subscribe())
    }

    /// Unfiltered torrent with the given id.
    pub async fn get(&self, id: i64) -> Option<Torrent> {
        self.state.lock().await.torrents.get(&id).cloned()
    }

    // ── Writers ──────────────────────────────────────────────────

    /// Replace the whole torrent set with the daemon's latest answer.
    pub async fn replace(&self, torrents: Vec<Torrent>, stats: SessionStats) -> Publication {
        let mut state = self.state.lock().await;
        state.torrents = torrents.into_iter().map(|t| (t.id, t)).collect();
        state.stats = Some(stats);
        self.publish(&mut state)
    }

    pub async fn set_session_info(&self, info: SessionInfo) -> Publication {
        let mut state = self.state.lock().await;
        state.info = Some(info);
        self.publish(&mut state)
    }

    pub async fn set_alt_speed(&self, enabled: bool) -> Publication {
        let mut state = self.state.lock().await;
        if let Some(info) = state.info.as_mut() {
            info.alt_speed_enabled = enabled;
        }
        self.publish(&mut state)
    }

    /// Change the status category and republish without a network call.
    pub async fn set_category(&self, category: StatusCategory) -> Publication {
        let mut state = self.state.lock().await;
        state.category = category;
        self.publish(&mut state)
    }

    /// Change the free-text filter and republish without a network call.
    pub async fn set_filter(&self, text: impl Into<String>) -> Publication {
        let mut state = self.state.lock().await;
        state.filter = text.into();
        self.publish(&mut state)
    }

    /// Drop torrents the daemon confirmed removed.
    pub async fn remove_ids(&self, ids: &[i64]) -> Publication {
        let mut state = self.state.lock().await;
        state.torrents.retain(|id, _| !ids.contains(id));
        self.publish(&mut state)
    }

    /// Insert a stand-in for a freshly added torrent unless the id is known.
    pub async fn insert_placeholder(&self, torrent: Torrent) -> Publication {
        let mut state = self.state.lock().await;
        state.torrents.entry(torrent.id).or_insert(torrent);
        self.publish(&mut state)
    }

    /// Forget everything tied to the session. The view filter survives.
    pub async fn clear(&self) -> Publication {
        let mut state = self.state.lock().await;
        state.torrents.clear();
        state.info = None;
        state.stats = None;
        self.publish(&mut state)
    }

    /// Reconcile and publish. Caller holds the lock.
    fn publish(&self, state: &mut TableState) -> Publication {
        let folder_deltas = state.folders.reconcile(state.torrents.values());
        let torrents = filter::classify(state.torrents.values(), state.category, &state.filter);
        let status_counts = StatusCounts::tally(state.torrents.values());

        let status_line = format::status_line(state.info.as_ref(), state.stats.as_ref());
        let (download, upload) = state
            .stats
            .as_ref()
            .map_or((0, 0), |s| (s.download_speed, s.upload_speed));

        state.generation += 1;
        let changed_line = (status_line != state.status_line).then(|| status_line.clone());
        state.status_line.clone_from(&status_line);

        let snapshot = Snapshot {
            generation: state.generation,
            torrents,
            folders: state.folders.categories(),
            status_counts,
            category: state.category,
            filter: state.filter.clone(),
            info: state.info.clone(),
            stats: state.stats.clone(),
            status_line,
            download_speed: format!("D: {}", format::speed(download)),
            upload_speed: format!("U: {}", format::speed(upload)),
        };
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(snapshot));

        Publication {
            folder_deltas,
            status_line: changed_line,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::TorrentStatus;

    fn torrent(id: i64, status: i64, dir: &str) -> Torrent {
        Torrent {
            id,
            name: format!("t{id}"),
            status: TorrentStatus::from_code(status),
            download_dir: dir.into(),
            ..Torrent::default()
        }
    }

    fn ids(snap: &Snapshot) -> Vec<i64> {
        snap.torrents.iter().map(|t| t.id).collect()
    }

    #[tokio::test]
    async fn replace_publishes_filtered_view_and_counts() {
        let table = EntityTable::new();
        table.set_category(StatusCategory::Stopped).await;

        let publication = table
            .replace(
                vec![torrent(1, 0, "/a"), torrent(2, 4, "/a/"), torrent(3, 0, "/b")],
                SessionStats::default(),
            )
            .await;

        let snap = table.snapshot();
        assert_eq!(ids(&snap), vec![1, 3]);
        assert_eq!(snap.status_counts.get(StatusCategory::All), 3);
        assert_eq!(snap.folders.len(), 2);
        assert_eq!(publication.folder_deltas.len(), 2);
        assert_eq!(snap.download_speed, "D: 0 b/s");
    }

    #[tokio::test]
    async fn filter_change_republishes_without_new_data() {
        let table = EntityTable::new();
        table
            .replace(vec![torrent(1, 0, "/a"), torrent(2, 0, "/b")], SessionStats::default())
            .await;
        let before = table.snapshot().generation;

        table.set_filter("{p}:/b").await;

        let snap = table.snapshot();
        assert_eq!(ids(&snap), vec![2]);
        assert!(snap.generation > before);
        // Folder categories ignore the view filter.
        assert_eq!(snap.folders.len(), 2);
    }

    #[tokio::test]
    async fn remove_ids_excises_only_the_removed() {
        let table = EntityTable::new();
        table
            .replace(
                vec![torrent(1, 0, "/a"), torrent(2, 0, "/b"), torrent(3, 0, "/a")],
                SessionStats::default(),
            )
            .await;

        let publication = table.remove_ids(&[2]).await;

        assert_eq!(ids(&table.snapshot()), vec![1, 3]);
        assert!(matches!(
            publication.folder_deltas.as_slice(),
            [FolderDelta::Removed(f)] if f.path() == "/b/"
        ));
    }

    #[tokio::test]
    async fn placeholder_does_not_clobber_known_torrent() {
        let table = EntityTable::new();
        table
            .replace(vec![torrent(1, 6, "/a")], SessionStats::default())
            .await;

        table.insert_placeholder(Torrent::placeholder(1, "other", "h")).await;
        table.insert_placeholder(Torrent::placeholder(2, "new", "h2")).await;

        let snap = table.snapshot();
        assert_eq!(ids(&snap), vec![1, 2]);
        assert_eq!(snap.torrent(1).map(|t| t.name.as_str()), Some("t1"));
    }

    #[tokio::test]
    async fn status_line_change_is_reported_once() {
        let table = EntityTable::new();
        let info = SessionInfo {
            version: "4.0.5".into(),
            rpc_version: "17".into(),
            ..SessionInfo::default()
        };

        let first = table.set_session_info(info).await;
        assert_eq!(first.status_line.as_deref(), Some("Transmission 4.0.5 (RPC:17)"));

        let second = table.set_category(StatusCategory::Ended).await;
        assert!(second.status_line.is_none());

        let cleared = table.clear().await;
        assert_eq!(cleared.status_line.as_deref(), Some(""));
        assert!(table.snapshot().torrents.is_empty());
    }
}
