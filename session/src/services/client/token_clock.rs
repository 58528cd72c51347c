//! Pure session-freshness arithmetic.
//!
//! All inputs are epoch milliseconds. A missing issue time always reads as
//! expired so that an unknown-freshness session goes down the recovery path
//! instead of being trusted forever.

const MS_PER_MINUTE: f64 = 60_000.0;

/// Where a session stands relative to its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Expiring,
    Expired,
}

/// Epoch millisecond at which a session issued at `token_issued_at` ends.
pub fn expires_at(token_issued_at: i64, session_duration_ms: u64) -> i64 {
    token_issued_at.saturating_add(session_duration_ms.min(i64::MAX as u64) as i64)
}

/// Minutes left before expiry. Negative once the session has lapsed.
pub fn time_until_expiry_minutes(now: i64, token_issued_at: i64, session_duration_ms: u64) -> f64 {
    (expires_at(token_issued_at, session_duration_ms) as f64 - now as f64) / MS_PER_MINUTE
}

/// True when `0 < remaining <= threshold_minutes`.
pub fn is_expiring(
    now: i64,
    token_issued_at: Option<i64>,
    session_duration_ms: u64,
    threshold_minutes: f64,
) -> bool {
    match token_issued_at {
        Some(issued) => {
            let remaining = time_until_expiry_minutes(now, issued, session_duration_ms);
            remaining > 0.0 && remaining <= threshold_minutes
        }
        None => false,
    }
}

/// True when the session has lapsed or was never recorded.
pub fn is_expired(now: i64, token_issued_at: Option<i64>, session_duration_ms: u64) -> bool {
    match token_issued_at {
        Some(issued) => time_until_expiry_minutes(now, issued, session_duration_ms) <= 0.0,
        None => true,
    }
}

/// Classify a session; expiry takes precedence over the refresh window.
pub fn evaluate(
    now: i64,
    token_issued_at: Option<i64>,
    session_duration_ms: u64,
    threshold_minutes: f64,
) -> TokenStatus {
    if is_expired(now, token_issued_at, session_duration_ms) {
        TokenStatus::Expired
    } else if is_expiring(now, token_issued_at, session_duration_ms, threshold_minutes) {
        TokenStatus::Expiring
    } else {
        TokenStatus::Valid
    }
}
