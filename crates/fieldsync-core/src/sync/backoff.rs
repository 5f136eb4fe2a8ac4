//! Retry delay policy for failed queue items

/// Delay before the first retry
pub const BASE_RETRY_DELAY_SECS: i64 = 3;

/// Upper bound for any retry delay
pub const MAX_RETRY_DELAY_SECS: i64 = 180;

/// `min(180, 3 * 2^max(0, attempt))` seconds.
pub fn retry_delay_secs(attempt: i64) -> i64 {
    let exponent = attempt.max(0);
    // 2^6 * 3 already exceeds the ceiling
    if exponent >= 6 {
        return MAX_RETRY_DELAY_SECS;
    }
    (BASE_RETRY_DELAY_SECS << exponent).min(MAX_RETRY_DELAY_SECS)
}

/// [`retry_delay_secs`] in milliseconds
pub fn retry_delay_millis(attempt: i64) -> i64 {
    retry_delay_secs(attempt) * 1000
}
