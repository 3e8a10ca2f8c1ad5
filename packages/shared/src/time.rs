//! Time helpers. All timestamps are Unix milliseconds rendered in KST (UTC+9).

use chrono::{DateTime, FixedOffset, Offset, Utc};

const KST_OFFSET_SECS: i32 = 9 * 3600;

fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Get current Unix timestamp in KST (milliseconds)
pub fn get_kst_timestamp() -> i64 {
    Utc::now().with_timezone(&kst()).timestamp_millis()
}

/// Convert a Unix timestamp (milliseconds) to an RFC 3339 string in KST.
///
/// Out-of-range values fall back to the Unix epoch.
pub fn timestamp_to_kst_rfc3339(timestamp_millis: i64) -> String {
    let utc = DateTime::<Utc>::from_timestamp_millis(timestamp_millis).unwrap_or_default();
    utc.with_timezone(&kst()).to_rfc3339()
}
