//! Output formatting: table or plain.
//!
//! Tables use `tabled`; plain emits one torrent id per line.

use tabled::{Table, Tabled, settings::Style};

use riptide_core::{Endpoint, FolderCategory, Snapshot, Torrent, format};

use crate::cli::OutputFormat;

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct TorrentRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Done")]
    done: String,
    #[tabled(rename = "Down")]
    down: String,
    #[tabled(rename = "Up")]
    up: String,
    #[tabled(rename = "Folder")]
    folder: String,
}

impl From<&Torrent> for TorrentRow {
    fn from(t: &Torrent) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            status: t.status.to_string(),
            done: format!("{:.1}%", t.percent_done * 100.0),
            down: format::speed(t.rate_download),
            up: format::speed(t.rate_upload),
            folder: riptide_core::model::folder_name(&t.download_dir).to_owned(),
        }
    }
}

#[derive(Tabled)]
struct ServerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Default")]
    default: String,
}

// ── Renderers ────────────────────────────────────────────────────────

pub fn render_torrents(format: OutputFormat, torrents: &[Torrent]) -> String {
    match format {
        OutputFormat::Table => render_table(torrents.iter().map(TorrentRow::from)),
        OutputFormat::Plain => torrents
            .iter()
            .map(|t| t.id.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn render_servers(format: OutputFormat, endpoints: &[Endpoint], default: Option<&str>) -> String {
    match format {
        OutputFormat::Table => render_table(endpoints.iter().map(|e| ServerRow {
            name: e.name.clone(),
            url: e.url.to_string(),
            user: e.username.clone().unwrap_or_default(),
            default: if Some(e.name.as_str()) == default {
                "*".into()
            } else {
                String::new()
            },
        })),
        OutputFormat::Plain => endpoints
            .iter()
            .map(|e| e.name.clone())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Header lines shown above a torrent list.
pub fn render_summary(snap: &Snapshot) -> String {
    let counts = snap
        .status_counts
        .iter()
        .map(|(category, count)| format!("{} {count}", category.title()))
        .collect::<Vec<_>>()
        .join("  ");
    format!(
        "{}\n{}   {}\n{counts}",
        snap.status_line, snap.download_speed, snap.upload_speed
    )
}

pub fn render_folders(folders: &[std::sync::Arc<FolderCategory>]) -> String {
    folders
        .iter()
        .map(|f| format!("  {}  {}", f.title(), f.path()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Multi-line detail view of one torrent.
pub fn render_detail(t: &Torrent) -> String {
    let mut lines = vec![
        format!("ID:        {}", t.id),
        format!("Name:      {}", t.name),
        format!("Hash:      {}", t.hash),
        format!("Status:    {}", t.status),
        format!("Done:      {:.1}%", t.percent_done * 100.0),
        format!("Location:  {}", t.download_dir),
    ];
    if let Some(size) = t.total_size {
        lines.push(format!(
            "Size:      {}",
            format::size(u64::try_from(size).unwrap_or_default())
        ));
    }
    if let Some(ratio) = t.upload_ratio {
        lines.push(format!("Ratio:     {ratio:.2}"));
    }
    if let Some(added) = t.added {
        lines.push(format!("Added:     {}", added.format("%Y-%m-%d %H:%M")));
    }
    if t.has_error() {
        lines.push(format!("Error:     {}", t.error_string));
    }
    if let Some(magnet) = &t.magnet_link {
        lines.push(format!("Magnet:    {magnet}"));
    }
    for tracker in &t.trackers {
        let state = if tracker.last_announce_succeeded {
            "ok"
        } else {
            tracker.last_announce_result.as_str()
        };
        lines.push(format!("Tracker:   {} ({state})", tracker.host));
    }
    for (idx, file) in t.files.iter().enumerate() {
        let wanted = match file.wanted {
            Some(false) => "skip",
            _ => "get",
        };
        lines.push(format!("File {idx:>3}:  [{wanted}] {}", file.name));
    }
    lines.join("\n")
}

fn render_table<R: Tabled>(rows: impl IntoIterator<Item = R>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    println!("{output}");
}
