//! Formatting utilities (HTML escaping, human sizes, coarse ages).

use chrono::{DateTime, FixedOffset, Utc};

use crate::{errors::Error, Result};

const SIZE_UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a byte count as `"<value> <unit>"` using 1024-based units.
///
/// The value is rounded to two decimals and printed without padding, so
/// `1536` is `"1.5 KB"` and `1024` is `"1 KB"`.
pub fn human_size(size: i64) -> Result<String> {
    if size < 0 {
        return Err(Error::InvalidInput(format!("negative size: {size}")));
    }
    if size == 0 {
        return Ok("0 B".to_string());
    }

    let bytes = size as u64;
    let mut idx = 0usize;
    let mut divisor: u64 = 1;
    while idx + 1 < SIZE_UNITS.len() {
        match divisor.checked_mul(1024) {
            Some(next) if next <= bytes => {
                divisor = next;
                idx += 1;
            }
            _ => break,
        }
    }

    let value = round2(bytes as f64 / divisor as f64);
    Ok(format!("{value} {}", SIZE_UNITS[idx]))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Coarse "time ago" label: only the largest non-zero unit of `d`, `h`, `m`, `s`.
///
/// Timestamps in the future clamp to `"0 s"`.
pub fn format_age(published: DateTime<FixedOffset>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(published).num_seconds().max(0);

    let days = elapsed / 86_400;
    if days > 0 {
        return format!("{days} d");
    }
    let hours = elapsed / 3600;
    if hours > 0 {
        return format!("{hours} h");
    }
    let mins = elapsed / 60;
    if mins > 0 {
        return format!("{mins} m");
    }
    format!("{elapsed} s")
}
