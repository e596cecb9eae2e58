//! Snapshot rendering: progress bar, human-scaled sizes, ETA.

use crate::state::{Phase, Snapshot};

/// Number of segments in the rendered progress bar.
const BAR_SEGMENTS: usize = 10;

/// Formats a byte count using base-1024 units (B/KB/MB/GB).
pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

fn render_bar(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * BAR_SEGMENTS as f64).round() as usize;
    let mut bar = String::with_capacity(BAR_SEGMENTS * 3);
    for _ in 0..filled {
        bar.push('█');
    }
    for _ in filled..BAR_SEGMENTS {
        bar.push('░');
    }
    bar
}

fn format_eta(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// Renders a snapshot into the user-facing progress message.
///
/// With a known total:
/// ```text
/// ⬇️ Downloading · 1080p
/// [█████░░░░░] 52.3%
/// 15.2 MB of 29.1 MB · 1.8 MB/s · ETA 8s
/// ```
/// Without one, only the byte count and speed are shown.
pub fn render_snapshot(snap: &Snapshot) -> String {
    let icon = match snap.phase {
        Phase::Downloading => "⬇️",
        Phase::Uploading => "⬆️",
    };
    let mut header = format!("{icon} {}", snap.phase.label());
    if let Some(quality) = &snap.quality {
        header.push_str(" · ");
        header.push_str(quality);
    }

    let mut lines = vec![header];
    match snap.total.filter(|t| *t > 0) {
        Some(total) => {
            let fraction = snap.bytes as f64 / total as f64;
            lines.push(format!(
                "[{}] {:.1}%",
                render_bar(fraction),
                fraction.clamp(0.0, 1.0) * 100.0
            ));

            let mut detail = format!("{} of {}", human_size(snap.bytes), human_size(total));
            if snap.speed_bps > 0.0 {
                detail.push_str(&format!(" · {}/s", human_size(snap.speed_bps as u64)));
                let remaining = total.saturating_sub(snap.bytes);
                let eta_secs = (remaining as f64 / snap.speed_bps) as u64;
                detail.push_str(&format!(" · ETA {}", format_eta(eta_secs)));
            }
            lines.push(detail);
        }
        None => {
            let mut detail = human_size(snap.bytes);
            if snap.speed_bps > 0.0 {
                detail.push_str(&format!(" · {}/s", human_size(snap.speed_bps as u64)));
            }
            lines.push(detail);
        }
    }

    lines.join("\n")
}
