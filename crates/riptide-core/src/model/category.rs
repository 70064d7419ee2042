// ── Status and folder categories ──
//
// Status categories are a fixed set with a predicate each. Folder
// categories are derived from download directories and keep their
// identity across ticks while only the count changes.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::torrent::{Torrent, TorrentStatus};

// ── StatusCategory ───────────────────────────────────────────────

/// Fixed status filter selectable by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusCategory {
    #[default]
    All,
    Downloading,
    Active,
    Inactive,
    Ended,
    Stopped,
    Error,
}

impl StatusCategory {
    /// Human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Downloading => "Downloading",
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Ended => "Ended",
            Self::Stopped => "Stopped",
            Self::Error => "Error",
        }
    }

    /// Whether `torrent` belongs to this category, judged on the daemon's
    /// own status (before any display override).
    pub fn matches(self, torrent: &Torrent) -> bool {
        use TorrentStatus as S;
        let status = torrent.status;
        match self {
            Self::All => true,
            Self::Downloading => matches!(status, S::DownloadWait | S::Downloading),
            Self::Active => {
                matches!(status, S::Checking | S::Downloading | S::Seeding)
                    && (torrent.rate_download > 1 || torrent.rate_upload > 1)
            }
            Self::Stopped => status == S::Stopped && !torrent.has_error(),
            Self::Error => torrent.has_error(),
            // CheckWait (1) is deliberately not excluded here.
            Self::Inactive => {
                torrent.rate_download <= 0 && torrent.rate_upload <= 0 && status != S::Checking
            }
            Self::Ended => status == S::Seeding,
        }
    }
}

/// Per-category entity counts over the full, unfiltered entity set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusCounts {
    counts: Vec<(StatusCategory, usize)>,
}

impl StatusCounts {
    pub fn tally<'a>(torrents: impl IntoIterator<Item = &'a Torrent> + Clone) -> Self {
        let counts = StatusCategory::iter()
            .map(|cat| {
                let n = torrents.clone().into_iter().filter(|t| cat.matches(t)).count();
                (cat, n)
            })
            .collect();
        Self { counts }
    }

    pub fn get(&self, category: StatusCategory) -> usize {
        self.counts
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatusCategory, usize)> + '_ {
        self.counts.iter().copied()
    }
}

// ── Folder paths ─────────────────────────────────────────────────

/// Canonical trailing-separator form of a directory path.
///
/// Idempotent, so `/x` and `/x/` compare equal once normalized. The empty
/// path stays empty.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() || path.ends_with('/') || path.ends_with('\\') {
        path.to_owned()
    } else if path.contains('\\') && !path.contains('/') {
        format!("{path}\\")
    } else {
        format!("{path}/")
    }
}

/// Last path component of a directory, ignoring trailing separators.
pub fn folder_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None if trimmed.is_empty() => path,
        None => trimmed,
    }
}

// ── FolderCategory ───────────────────────────────────────────────

/// Category derived from one normalized download directory.
///
/// Identity is the normalized path. The count is the only mutable part,
/// so instances are shared by `Arc` and survive across ticks.
#[derive(Debug)]
pub struct FolderCategory {
    path: String,
    name: String,
    count: AtomicUsize,
}

impl FolderCategory {
    pub fn new(path: &str) -> Self {
        let path = normalize_path(path);
        let name = folder_name(&path).to_owned();
        Self {
            path,
            name,
            count: AtomicUsize::new(0),
        }
    }

    /// Normalized full path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Directory name shown to users.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Returns `true` if the count changed.
    pub(crate) fn set_count(&self, count: usize) -> bool {
        self.count.swap(count, Ordering::Relaxed) != count
    }

    /// `"<name> (<count>)"`.
    pub fn title(&self) -> String {
        format!("{} ({})", self.name, self.count())
    }
}

impl PartialEq for FolderCategory {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FolderCategory {}

impl fmt::Display for FolderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torrent(status: i64, down: i64, up: i64) -> Torrent {
        Torrent {
            status: TorrentStatus::from_code(status),
            rate_download: down,
            rate_upload: up,
            ..Torrent::default()
        }
    }

    #[test]
    fn normalize_is_idempotent_and_merges_trailing_separator() {
        for p in ["/dl/movies", "/dl/movies/", "C:\\data", "relative/dir", "/"] {
            let once = normalize_path(p);
            assert_eq!(normalize_path(&once), once);
        }
        assert_eq!(normalize_path("/dl/movies"), normalize_path("/dl/movies/"));
        assert_eq!(normalize_path("C:\\data"), "C:\\data\\");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn folder_name_takes_last_component() {
        assert_eq!(folder_name("/dl/movies/"), "movies");
        assert_eq!(folder_name("/dl/movies"), "movies");
        assert_eq!(folder_name("C:\\data\\tv\\"), "tv");
        assert_eq!(folder_name("/"), "/");
    }

    #[test]
    fn folder_title_embeds_count() {
        let folder = FolderCategory::new("/dl/music");
        assert!(folder.set_count(3));
        assert!(!folder.set_count(3));
        assert_eq!(folder.title(), "music (3)");
        assert_eq!(folder.path(), "/dl/music/");
    }

    #[test]
    fn active_requires_rate_above_one() {
        assert!(StatusCategory::Active.matches(&torrent(4, 10, 0)));
        assert!(StatusCategory::Active.matches(&torrent(6, 0, 2)));
        assert!(!StatusCategory::Active.matches(&torrent(4, 1, 1)));
        assert!(!StatusCategory::Active.matches(&torrent(3, 100, 0)));
    }

    #[test]
    fn inactive_keeps_check_wait_but_not_checking() {
        assert!(StatusCategory::Inactive.matches(&torrent(1, 0, 0)));
        assert!(!StatusCategory::Inactive.matches(&torrent(2, 0, 0)));
        assert!(!StatusCategory::Inactive.matches(&torrent(6, 0, 5)));
    }

    #[test]
    fn stopped_and_error_split_on_error_string() {
        let mut t = torrent(0, 0, 0);
        assert!(StatusCategory::Stopped.matches(&t));
        assert!(!StatusCategory::Error.matches(&t));

        t.error_string = "Tracker gave HTTP response code 404".into();
        assert!(!StatusCategory::Stopped.matches(&t));
        assert!(StatusCategory::Error.matches(&t));
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Downloading".parse::<StatusCategory>().ok(), Some(StatusCategory::Downloading));
        assert_eq!(StatusCategory::Ended.to_string(), "ended");
    }

    #[test]
    fn counts_cover_every_category() {
        let set = [torrent(4, 10, 0), torrent(0, 0, 0), torrent(6, 0, 0)];
        let counts = StatusCounts::tally(&set);
        assert_eq!(counts.get(StatusCategory::All), 3);
        assert_eq!(counts.get(StatusCategory::Downloading), 1);
        assert_eq!(counts.get(StatusCategory::Active), 1);
        assert_eq!(counts.get(StatusCategory::Inactive), 2);
        assert_eq!(counts.get(StatusCategory::Ended), 1);
        assert_eq!(counts.get(StatusCategory::Stopped), 1);
        assert_eq!(counts.iter().count(), 7);
    }
}
