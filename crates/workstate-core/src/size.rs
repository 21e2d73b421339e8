//! Human-readable byte counts.

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with 1024-based units and one decimal place.
///
/// Counts beyond the terabyte range are expressed in PB.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;

    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }

    format!("{:.1} PB", size)
}
