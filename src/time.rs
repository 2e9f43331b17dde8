/// Integer-second bucket a playback position belongs to.
///
/// Always the floor of `t`, so `4.99` lands in bucket `4`. Negative and
/// non-finite positions fall into bucket `0`.
pub fn bucket_of(t: f64) -> u32 {
    if !t.is_finite() || t <= 0.0 {
        return 0;
    }
    let floored = t.floor();
    if floored >= u32::MAX as f64 {
        u32::MAX
    } else {
        floored as u32
    }
}

/// String key used for a bucket in the persisted stroke map.
pub fn bucket_key(t: f64) -> String {
    bucket_of(t).to_string()
}

/// Parse a persisted bucket key back into its second. Only the form
/// `bucket_key` writes is accepted: plain digits without leading zeros.
pub fn parse_bucket_key(key: &str) -> Option<u32> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<u32>().ok()
}

/// Canonical spelling of a digit-only key such as `"012"`, if it differs.
pub fn canonical_bucket_key(key: &str) -> Option<String> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let canonical = key.parse::<u32>().ok()?.to_string();
    (canonical != key).then_some(canonical)
}

/// Render a position as `mm:ss`. Minutes are not wrapped at the hour.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}
