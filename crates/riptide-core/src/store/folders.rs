// ── Folder category aggregation ──
//
// Derives folder categories from the unfiltered torrent set and diffs
// them against the previously published set. Instances are reused across
// ticks, so consumers holding an `Arc<FolderCategory>` keep seeing the
// same object with a refreshed count.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use crate::model::{FolderCategory, Torrent, normalize_path};

/// One incremental change to the folder-category set.
#[derive(Debug, Clone)]
pub enum FolderDelta {
    Removed(Arc<FolderCategory>),
    Added(Arc<FolderCategory>),
    /// Present before and after; only the count moved.
    Updated(Arc<FolderCategory>),
}

impl FolderDelta {
    pub fn folder(&self) -> &Arc<FolderCategory> {
        match self {
            Self::Removed(f) | Self::Added(f) | Self::Updated(f) => f,
        }
    }
}

/// The currently published folder categories, keyed by normalized path.
#[derive(Debug, Default)]
pub struct FolderSet {
    folders: IndexMap<String, Arc<FolderCategory>>,
}

impl FolderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current categories in first-seen order.
    pub fn categories(&self) -> Vec<Arc<FolderCategory>> {
        self.folders.values().cloned().collect()
    }

    pub fn get(&self, path: &str) -> Option<&Arc<FolderCategory>> {
        self.folders.get(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Bring the set in line with `torrents`.
    ///
    /// Deltas come out as removals, then count updates, then additions.
    /// Torrents with an empty download directory are not grouped.
    pub fn reconcile<'a>(&mut self, torrents: impl IntoIterator<Item = &'a Torrent>) -> Vec<FolderDelta> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for torrent in torrents {
            let path = normalize_path(&torrent.download_dir);
            if path.is_empty() {
                continue;
            }
            *counts.entry(path).or_default() += 1;
        }

        let mut deltas = Vec::new();

        let stale: Vec<String> = self
            .folders
            .keys()
            .filter(|path| !counts.contains_key(*path))
            .cloned()
            .collect();
        if !stale.is_empty() {
            info!(folders = ?stale, "remove categories");
        }
        for path in stale {
            if let Some(folder) = self.folders.shift_remove(&path) {
                deltas.push(FolderDelta::Removed(folder));
            }
        }

        let mut added = Vec::new();
        for (path, count) in counts {
            if let Some(folder) = self.folders.get(&path) {
                if folder.set_count(count) {
                    deltas.push(FolderDelta::Updated(Arc::clone(folder)));
                }
            } else {
                let folder = Arc::new(FolderCategory::new(&path));
                folder.set_count(count);
                added.push(Arc::clone(&folder));
                self.folders.insert(path, folder);
            }
        }
        if !added.is_empty() {
            info!(
                folders = ?added.iter().map(|f| f.path()).collect::<Vec<_>>(),
                "add categories"
            );
        }
        deltas.extend(added.into_iter().map(FolderDelta::Added));

        deltas
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn in_dir(id: i64, dir: &str) -> Torrent {
        Torrent {
            id,
            download_dir: dir.into(),
            ..Torrent::default()
        }
    }

    fn paths(set: &FolderSet) -> Vec<String> {
        set.categories().iter().map(|f| f.path().to_owned()).collect()
    }

    #[test]
    fn trailing_separator_variants_share_one_folder() {
        let mut set = FolderSet::new();
        let deltas = set.reconcile(&[in_dir(1, "/dl/movies"), in_dir(2, "/dl/movies/")]);

        assert_eq!(set.len(), 1);
        assert_eq!(deltas.len(), 1);
        assert!(matches!(deltas[0], FolderDelta::Added(_)));
        assert_eq!(set.get("/dl/movies").map(|f| f.count()), Some(2));
        assert_eq!(set.get("/dl/movies").map(|f| f.title()), Some("movies (2)".into()));
    }

    #[test]
    fn surviving_folders_keep_identity() {
        let mut set = FolderSet::new();
        set.reconcile(&[in_dir(1, "/a"), in_dir(2, "/b")]);
        let before = Arc::clone(set.get("/a").unwrap_or_else(|| panic!("missing /a")));

        let deltas = set.reconcile(&[in_dir(1, "/a"), in_dir(3, "/a"), in_dir(4, "/c")]);

        let after = set.get("/a").unwrap_or_else(|| panic!("missing /a"));
        assert!(Arc::ptr_eq(&before, after));
        assert_eq!(after.count(), 2);

        let kinds: Vec<(&str, &str)> = deltas
            .iter()
            .map(|d| {
                let kind = match d {
                    FolderDelta::Removed(_) => "removed",
                    FolderDelta::Updated(_) => "updated",
                    FolderDelta::Added(_) => "added",
                };
                (kind, d.folder().path())
            })
            .collect();
        assert_eq!(kinds, vec![("removed", "/b/"), ("updated", "/a/"), ("added", "/c/")]);
    }

    #[test]
    fn new_set_is_old_minus_removed_plus_added() {
        let mut set = FolderSet::new();
        set.reconcile(&[in_dir(1, "/x"), in_dir(2, "/y")]);
        let old = paths(&set);

        let deltas = set.reconcile(&[in_dir(3, "/y"), in_dir(4, "/z")]);

        let mut expected: Vec<String> = old
            .into_iter()
            .filter(|p| {
                !deltas
                    .iter()
                    .any(|d| matches!(d, FolderDelta::Removed(f) if f.path() == p))
            })
            .collect();
        expected.extend(deltas.iter().filter_map(|d| match d {
            FolderDelta::Added(f) => Some(f.path().to_owned()),
            _ => None,
        }));

        assert_eq!(paths(&set), expected);
    }

    #[test]
    fn unchanged_counts_produce_no_deltas() {
        let mut set = FolderSet::new();
        let torrents = [in_dir(1, "/a"), in_dir(2, "")];
        set.reconcile(&torrents);
        assert!(set.reconcile(&torrents).is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn empty_input_removes_everything() {
        let mut set = FolderSet::new();
        set.reconcile(&[in_dir(1, "/a"), in_dir(2, "/b")]);
        let deltas = set.reconcile(std::iter::empty());
        assert_eq!(deltas.len(), 2);
        assert!(set.is_empty());
    }
}
