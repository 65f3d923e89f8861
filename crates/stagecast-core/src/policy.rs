//! Session-wide policy constants.
//!
//! These are fixed for every session; no call site takes them as parameters.

use std::time::Duration;

/// Renew this long before expiry when the credential is long-lived.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Credentials living less than this use the proportional fast path.
pub const SHORT_LIVED_THRESHOLD: Duration = Duration::from_secs(10 * 60);

/// Floor for the refresh timer once the retained credential has expired.
pub const MIN_REFRESH_DELAY: Duration = Duration::from_secs(5);

/// Reconnect attempts after a drop before the push channel is exhausted.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Cap on a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// A push connection that yields no frame for this long is treated as dropped.
pub const PUSH_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// A fallback subscription silent for this long is torn down and reopened.
///
/// Longer than the push timeout: documents can legitimately sit unchanged
/// for minutes between game phases.
pub const FALLBACK_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Same-phase candidates closer than this to the accepted one are duplicates.
pub const DEDUP_WINDOW: Duration = Duration::from_millis(100);

/// Capacity of the candidate queue feeding the reconciler.
pub const CANDIDATE_QUEUE_CAPACITY: usize = 256;

/// Capacity of the session event broadcast.
pub const EVENT_BUFFER: usize = 1024;

/// Delay before renewing a credential with `lifetime` left.
///
/// At least ten minutes left: renew five minutes before expiry.
/// Less: renew after 80% of the remaining lifetime.
pub fn refresh_delay(lifetime: chrono::Duration) -> Duration {
    let Ok(lifetime) = lifetime.to_std() else {
        return MIN_REFRESH_DELAY;
    };
    if lifetime.is_zero() {
        return MIN_REFRESH_DELAY;
    }
    if lifetime >= SHORT_LIVED_THRESHOLD {
        lifetime.saturating_sub(REFRESH_MARGIN)
    } else {
        lifetime * 4 / 5
    }
}

/// Delay before reconnect attempt `attempt` (1-based): `min(60s, 2^(n-1) s)`.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    Duration::from_secs(1_u64 << exponent).min(MAX_BACKOFF)
}
