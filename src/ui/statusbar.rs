use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

use crate::format::{center, format_gb, pad_right, truncate_unicode};
use crate::system::snapshot::SystemSnapshot;

const MAX_TEMPERATURES: usize = 3;
const FIELD_SEPARATOR: &str = " | ";

/// `-- Showing A-B of N --`, with A = 0 for an empty table.
pub fn showing(scroll_index: usize, end: usize, total: usize) -> String {
    let start = if total == 0 { 0 } else { scroll_index + 1 };
    format!("-- Showing {start}-{end} of {total} --")
}

pub fn summary(system: &SystemSnapshot) -> String {
    let mut out = String::new();

    match system.uptime_hours {
        Some(h) => {
            let _ = write!(out, "Uptime: {h:.1}h");
        }
        None => out.push_str("Uptime: ?"),
    }
    match &system.load_average {
        Some(load) => {
            let _ = write!(out, " | Load: {load}");
        }
        None => out.push_str(" | Load: ?"),
    }
    match system.cpu_usage_percent {
        Some(cpu) => {
            let _ = write!(out, " | CPU: {cpu:.1}%");
        }
        None => out.push_str(" | CPU: ?"),
    }
    match (system.mem_usage_percent, system.total_memory_bytes) {
        (Some(pct), Some(total)) => {
            let used = (total as f64 * pct / 100.0) as u64;
            let _ = write!(
                out,
                " | Mem: {pct:.1}% ({}/{} GB)",
                format_gb(used),
                format_gb(total)
            );
        }
        (Some(pct), None) => {
            let _ = write!(out, " | Mem: {pct:.1}%");
        }
        (None, _) => out.push_str(" | Mem: ?"),
    }
    for (sensor, celsius) in system.temperatures.iter().take(MAX_TEMPERATURES) {
        let _ = write!(out, " | {sensor}: {celsius:.1}°C");
    }

    out
}

/// Status text centered across `width`, with as many whole summary fields
/// as fit to its left. Nothing of the summary shows when even its first
/// field does not fit.
pub fn status_line(summary: &str, status: &str, width: usize) -> String {
    let shown = truncate_unicode(status, width);
    let left = (width - shown.width()) / 2;
    let centered = center(status, width);
    // `center` pads with exactly `left` ASCII spaces
    let mut out = pad_right(whole_fields(summary, left.saturating_sub(1)), left);
    out.push_str(&centered[left..]);
    out
}

/// Longest prefix of `summary` made of whole fields and no wider than `max_width`.
fn whole_fields(summary: &str, max_width: usize) -> &str {
    let ends = summary
        .match_indices(FIELD_SEPARATOR)
        .map(|(idx, _)| idx)
        .chain(std::iter::once(summary.len()));
    let mut end = 0;
    for idx in ends {
        if summary[..idx].width() > max_width {
            break;
        }
        end = idx;
    }
    &summary[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::capability::LoadAverage;
    use std::collections::BTreeMap;

    #[test]
    fn showing_counts_from_one() {
        assert_eq!(showing(0, 21, 100), "-- Showing 1-21 of 100 --");
        assert_eq!(showing(79, 100, 100), "-- Showing 80-100 of 100 --");
    }

    #[test]
    fn showing_empty_table() {
        assert_eq!(showing(0, 0, 0), "-- Showing 0-0 of 0 --");
    }

    #[test]
    fn summary_with_everything_missing() {
        assert_eq!(
            summary(&SystemSnapshot::default()),
            "Uptime: ? | Load: ? | CPU: ? | Mem: ?"
        );
    }

    #[test]
    fn summary_caps_temperatures_at_three() {
        let mut temperatures = BTreeMap::new();
        for (i, t) in [40.0, 41.0, 42.0, 43.0].into_iter().enumerate() {
            temperatures.insert(format!("t{i}"), t);
        }
        let system = SystemSnapshot {
            cpu_usage_percent: Some(12.34),
            mem_usage_percent: Some(50.0),
            total_memory_bytes: Some(16 * 1024 * 1024 * 1024),
            temperatures,
            uptime_hours: Some(5.5),
            load_average: Some(LoadAverage {
                one: 0.5,
                five: 0.25,
                fifteen: 0.0,
            }),
        };
        assert_eq!(
            summary(&system),
            "Uptime: 5.5h | Load: 0.50 0.25 0.00 | CPU: 12.3% | Mem: 50.0% (8.0/16.0 GB) \
             | t0: 40.0°C | t1: 41.0°C | t2: 42.0°C"
        );
    }

    #[test]
    fn status_line_keeps_status_centered() {
        let line = status_line("Uptime: 1.0h", "-- Showing 1-2 of 2 --", 60);
        assert_eq!(line.width(), 60);
        assert!(line.starts_with("Uptime: 1.0h"));
        assert_eq!(line.find("--"), Some(19));
    }

    #[test]
    fn status_line_omits_a_summary_whose_first_field_does_not_fit() {
        let line = status_line(&"x".repeat(100), "ab", 10);
        assert_eq!(line, "    ab    ");
        let line = status_line("Uptime: ? | Load: ?", "-- Showing 1-3 of 5 --", 30);
        assert_eq!(line, "    -- Showing 1-3 of 5 --    ");
    }

    #[test]
    fn status_line_cuts_summary_between_fields() {
        let line = status_line("Uptime: 1.0h | Load: 0.50 0.25 0.00 | CPU: 9.0%", "ab", 40);
        assert_eq!(line.width(), 40);
        assert!(line.starts_with("Uptime: 1.0h       ab"));
        assert!(!line.contains("Load"));
    }
}
