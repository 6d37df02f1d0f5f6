//! Byte size parsing and formatting.

use std::sync::LazyLock;

use regex::Regex;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[+-]?(\d+(?:\.\d+)?|\.\d+)").expect("valid regex"));

/// Converts `number` expressed in `unit` to bytes, using 1024-based
/// multiples. Empty or unknown units count as bytes.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn bytes_of(number: f64, unit: &str) -> u64 {
    let multiplier = match unit.to_ascii_lowercase().as_str() {
        "k" | "kb" => KB,
        "m" | "mb" => MB,
        "g" | "gb" => GB,
        _ => 1,
    };
    // `as` saturates: negatives become 0
    (number * multiplier as f64) as u64
}

/// Parses a size annotation such as `"1.5 MB"` or `"734003200"` into bytes.
///
/// Only the leading number and the letters of the text are considered.
/// Missing or unparseable text yields 0.
#[must_use]
pub fn parse_size(text: Option<&str>) -> u64 {
    let Some(text) = text else { return 0 };
    let number = LEADING_NUMBER
        .captures(text)
        .and_then(|c| c.get(0))
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .unwrap_or(0.0);
    let unit: String = text.chars().filter(char::is_ascii_alphabetic).collect();
    bytes_of(number, &unit)
}

/// Formats a byte count as a human-readable string (B, KB, MB, GB).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
