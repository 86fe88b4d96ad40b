//! Presentation helpers shared by front ends.

use chrono::DateTime;
use story_types::UnixTimestamp;

/// Render a creation timestamp as `Mar 5, 2024` (UTC).
pub fn format_date(ts: UnixTimestamp) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => ts.to_string(),
    }
}

/// `1 branch`, `2 branches`, `0 branches`.
pub fn branch_label(count: u64) -> String {
    if count == 1 {
        "1 branch".to_string()
    } else {
        format!("{count} branches")
    }
}
