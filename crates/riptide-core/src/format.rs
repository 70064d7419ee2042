// ── Display strings ──
//
// Status line and transfer-speed text published with every snapshot.

use std::time::Duration;

use bytesize::ByteSize;

use crate::model::{SessionInfo, SessionStats};

const SPEED_UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Base-1024 speed rounded to two decimals, e.g. `"1.5 MB/s"`.
/// Anything under one kilobyte per second reads `"0 b/s"`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn speed(bytes_per_sec: i64) -> String {
    let mut value = bytes_per_sec as f64 / 1024.0;
    if value < 1.0 {
        return "0 b/s".to_owned();
    }
    let mut unit = SPEED_UNITS[0];
    for &next in &SPEED_UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {unit}/s")
}

/// Human size with binary units, e.g. `"1.5 GiB"`.
pub fn size(bytes: u64) -> String {
    ByteSize(bytes).to_string_as(true)
}

/// Compact duration, e.g. `"1h 2m 5s"`.
pub fn active_time(seconds: u64) -> String {
    humantime::format_duration(Duration::from_secs(seconds)).to_string()
}

/// One-line session summary. Empty until the session info is known.
pub fn status_line(info: Option<&SessionInfo>, stats: Option<&SessionStats>) -> String {
    let Some(info) = info else {
        return String::new();
    };
    let mut line = format!("Transmission {} (RPC:{})", info.version, info.rpc_version);
    if let Some(stats) = stats {
        line.push_str(&format!(
            "      Uploaded {}      Downloaded {}      Active time {}",
            size(stats.uploaded_bytes),
            size(stats.downloaded_bytes),
            active_time(stats.seconds_active),
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_below_one_kilobyte_is_zero() {
        assert_eq!(speed(0), "0 b/s");
        assert_eq!(speed(1023), "0 b/s");
        assert_eq!(speed(-5), "0 b/s");
    }

    #[test]
    fn speed_picks_unit_and_rounds() {
        assert_eq!(speed(1024), "1 KB/s");
        assert_eq!(speed(1536), "1.5 KB/s");
        assert_eq!(speed(5 * 1024 * 1024 + 10_000), "5.01 MB/s");
        assert_eq!(speed(3 * 1024 * 1024 * 1024), "3 GB/s");
    }

    #[test]
    fn status_line_needs_session_info() {
        assert_eq!(status_line(None, Some(&SessionStats::default())), "");

        let info = SessionInfo {
            version: "4.0.5 (a6fe2a64aa)".into(),
            rpc_version: "17".into(),
            ..SessionInfo::default()
        };
        assert_eq!(status_line(Some(&info), None), "Transmission 4.0.5 (a6fe2a64aa) (RPC:17)");

        let stats = SessionStats {
            seconds_active: 3725,
            ..SessionStats::default()
        };
        let line = status_line(Some(&info), Some(&stats));
        assert!(line.starts_with("Transmission 4.0.5 (a6fe2a64aa) (RPC:17)      Uploaded "));
        assert!(line.ends_with("Active time 1h 2m 5s"), "{line}");
    }
}
