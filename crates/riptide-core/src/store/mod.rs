// ── Reactive data store ──
//
// Torrent table plus the folder-category aggregator it drives.

pub mod folders;
pub mod table;

pub use folders::{FolderDelta, FolderSet};
pub use table::{EntityTable, Publication, Snapshot};
