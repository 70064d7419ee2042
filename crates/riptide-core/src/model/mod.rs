// ── Domain model ──
//
// Canonical types shared by the engine and its consumers. Wire types
// from riptide-api are converted into these in `convert.rs`.

pub mod category;
pub mod endpoint;
pub mod session;
pub mod torrent;

pub use category::{FolderCategory, StatusCategory, StatusCounts, folder_name, normalize_path};
pub use endpoint::{Endpoint, SecretRef};
pub use session::{SessionInfo, SessionStats};
pub use torrent::{Torrent, TorrentFile, TorrentStatus, TrackerStat};
