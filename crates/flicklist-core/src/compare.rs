use chrono::NaiveDateTime;

/// Format of every activity timestamp FlickList reports
pub const ACTIVITY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Whole seconds since the Unix epoch, `None` when the string does not parse
pub fn epoch_seconds(timestamp: &str) -> Option<i64> {
    // chrono's `%.f` also accepts a missing or over-long fraction
    if !has_fraction(timestamp) {
        return None;
    }
    NaiveDateTime::parse_from_str(timestamp, ACTIVITY_TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// A `.` followed by one to six digits right before the trailing `Z`
fn has_fraction(timestamp: &str) -> bool {
    timestamp
        .strip_suffix('Z')
        .and_then(|rest| rest.rsplit_once('.'))
        .map(|(_, fraction)| (1..=6).contains(&fraction.len()) && fraction.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// True when `latest` is strictly later than `cached`, compared in whole seconds.
///
/// Fails open: if either side does not parse the answer is `true`, so a bad
/// timestamp costs an extra refresh instead of leaving stale data around.
pub fn is_newer(latest: &str, cached: &str) -> bool {
    match (epoch_seconds(latest), epoch_seconds(cached)) {
        (Some(latest), Some(cached)) => latest > cached,
        _ => true,
    }
}
