//! Human-readable byte formatting for log output.

const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count as a human-readable string with 1024 scaling.
///
/// Zero renders as `"0 Bytes"`, negative values as `-` followed by the
/// positive rendition. Values past the PB range render in raw bytes.
pub fn format_bytes(bytes: i64) -> String {
    if bytes < 0 {
        return format!("-{}", format_unsigned(bytes.unsigned_abs()));
    }
    format_unsigned(bytes as u64)
}

fn format_unsigned(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }

    // Past the largest unit: raw bytes are more honest than a huge PB figure.
    if value >= 1024.0 || unit == 0 {
        return format!("{bytes} Bytes");
    }

    // Two decimals with trailing zeros trimmed (1.50 KB -> 1.5 KB, 2.00 MB -> 2 MB)
    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", UNITS[unit])
}
