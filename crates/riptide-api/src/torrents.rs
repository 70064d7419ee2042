// Torrent RPC methods
//
// torrent-get with field projection, the id-only actions, queue moves,
// rename/relocate/remove, torrent-add and file selection.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio_util::sync::CancellationToken;

use crate::client::TransmissionClient;
use crate::error::Error;
use crate::models::{
    AddRequest, AddResponse, AddedTorrent, Empty, IdsRequest, RemoveRequest, RenamePathRequest,
    SetFilesRequest, SetLocationRequest, Torrent, TorrentGetRequest, TorrentList,
};

/// Fields fetched on every poll: enough to classify, filter and group.
pub const WORKING_FIELDS: &[&str] = &[
    "id",
    "name",
    "addedDate",
    "hashString",
    "rateDownload",
    "rateUpload",
    "recheckProgress",
    "percentDone",
    "uploadedEver",
    "status",
    "trackerStats",
    "downloadDir",
    "files",
    "error",
    "errorString",
];

/// Every field riptide knows how to decode, used for single-torrent detail.
pub const ALL_FIELDS: &[&str] = &[
    "id",
    "name",
    "hashString",
    "addedDate",
    "doneDate",
    "status",
    "percentDone",
    "recheckProgress",
    "rateDownload",
    "rateUpload",
    "uploadedEver",
    "downloadedEver",
    "totalSize",
    "sizeWhenDone",
    "leftUntilDone",
    "uploadRatio",
    "eta",
    "queuePosition",
    "peersConnected",
    "downloadDir",
    "error",
    "errorString",
    "comment",
    "creator",
    "isPrivate",
    "magnetLink",
    "trackerStats",
    "files",
    "fileStats",
];

/// Direction of a `queue-move-*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDirection {
    Top,
    Up,
    Down,
    Bottom,
}

impl QueueDirection {
    fn method(self) -> &'static str {
        match self {
            Self::Top => "queue-move-top",
            Self::Up => "queue-move-up",
            Self::Down => "queue-move-down",
            Self::Bottom => "queue-move-bottom",
        }
    }
}

/// What to hand the daemon in `torrent-add`.
#[derive(Debug, Clone)]
pub enum AddSource {
    /// Magnet link or URL the daemon fetches itself.
    Link(String),
    /// Raw `.torrent` file content.
    Metainfo(Vec<u8>),
}

impl TransmissionClient {
    // ── Queries ──────────────────────────────────────────────────────

    /// Fetch torrents with the given field projection. `ids = None` means all.
    pub async fn torrent_get(
        &self,
        fields: &[&str],
        ids: Option<&[i64]>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Torrent>, Error> {
        let args = TorrentGetRequest {
            fields: fields.to_vec(),
            ids,
        };
        let list: TorrentList = self.call("torrent-get", Some(&args), cancel).await?;
        Ok(list.torrents)
    }

    // ── Id-only actions ──────────────────────────────────────────────

    async fn ids_action(
        &self,
        method: &str,
        ids: &[i64],
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let _: Empty = self.call(method, Some(&IdsRequest { ids }), cancel).await?;
        Ok(())
    }

    pub async fn torrent_start(&self, ids: &[i64], cancel: &CancellationToken) -> Result<(), Error> {
        self.ids_action("torrent-start", ids, cancel).await
    }

    /// Start bypassing the download queue.
    pub async fn torrent_start_now(
        &self,
        ids: &[i64],
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        self.ids_action("torrent-start-now", ids, cancel).await
    }

    pub async fn torrent_stop(&self, ids: &[i64], cancel: &CancellationToken) -> Result<(), Error> {
        self.ids_action("torrent-stop", ids, cancel).await
    }

    pub async fn torrent_verify(&self, ids: &[i64], cancel: &CancellationToken) -> Result<(), Error> {
        self.ids_action("torrent-verify", ids, cancel).await
    }

    pub async fn torrent_reannounce(
        &self,
        ids: &[i64],
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        self.ids_action("torrent-reannounce", ids, cancel).await
    }

    pub async fn queue_move(
        &self,
        direction: QueueDirection,
        ids: &[i64],
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        self.ids_action(direction.method(), ids, cancel).await
    }

    // ── Mutations with arguments ─────────────────────────────────────

    /// Rename a file or folder inside a torrent. `path` is the current
    /// relative path, `name` the new last component.
    pub async fn torrent_rename_path(
        &self,
        id: i64,
        path: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let args = RenamePathRequest {
            ids: [id],
            path,
            name,
        };
        let _: Empty = self.call("torrent-rename-path", Some(&args), cancel).await?;
        Ok(())
    }

    /// Point torrents at a new directory, optionally moving the data.
    pub async fn torrent_set_location(
        &self,
        ids: &[i64],
        location: &str,
        move_data: bool,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let args = SetLocationRequest {
            ids,
            location,
            move_data,
        };
        let _: Empty = self.call("torrent-set-location", Some(&args), cancel).await?;
        Ok(())
    }

    pub async fn torrent_remove(
        &self,
        ids: &[i64],
        delete_local_data: bool,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let args = RemoveRequest {
            ids,
            delete_local_data,
        };
        let _: Empty = self.call("torrent-remove", Some(&args), cancel).await?;
        Ok(())
    }

    /// Mark files as wanted or unwanted. Indices refer to the torrent's `files` list.
    pub async fn torrent_set_files(
        &self,
        ids: &[i64],
        wanted: &[i64],
        unwanted: &[i64],
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let args = SetFilesRequest {
            ids,
            files_wanted: wanted,
            files_unwanted: unwanted,
        };
        let _: Empty = self.call("torrent-set", Some(&args), cancel).await?;
        Ok(())
    }

    /// Add a torrent. Returns the new (or already present) torrent's identity.
    pub async fn torrent_add(
        &self,
        source: &AddSource,
        download_dir: Option<&str>,
        paused: bool,
        cancel: &CancellationToken,
    ) -> Result<AddedTorrent, Error> {
        let mut args = AddRequest {
            download_dir: download_dir.map(String::from),
            paused,
            ..AddRequest::default()
        };
        match source {
            AddSource::Link(link) => args.filename = Some(link.clone()),
            AddSource::Metainfo(bytes) => args.metainfo = Some(STANDARD.encode(bytes)),
        }

        let resp: AddResponse = self.call("torrent-add", Some(&args), cancel).await?;
        resp.torrent_added
            .or(resp.torrent_duplicate)
            .ok_or_else(|| Error::Deserialization {
                message: "torrent-add answered without torrent-added or torrent-duplicate".into(),
                body: String::new(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_fields_are_a_subset_of_all_fields() {
        for field in WORKING_FIELDS {
            assert!(ALL_FIELDS.contains(field), "{field} missing from ALL_FIELDS");
        }
    }

    #[test]
    fn queue_methods_match_daemon_names() {
        assert_eq!(QueueDirection::Top.method(), "queue-move-top");
        assert_eq!(QueueDirection::Bottom.method(), "queue-move-bottom");
    }
}
