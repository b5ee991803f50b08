//! Retention windows and the expiry arithmetic shared by the providers.

use chrono::{DateTime, Duration, Utc};

/// Records kept by the embedded provider before a sweep removes them.
pub fn embedded_retention() -> Duration {
    Duration::days(7)
}

/// Lifetime written into the managed store's TTL attribute.
pub fn managed_retention() -> Duration {
    Duration::days(1)
}

/// Anything created strictly before this instant is due for removal.
pub fn sweep_cutoff(now: DateTime<Utc>, retention: Duration) -> DateTime<Utc> {
    now - retention
}

pub fn is_expired(created_at: DateTime<Utc>, retention: Duration, now: DateTime<Utc>) -> bool {
    created_at < sweep_cutoff(now, retention)
}

/// Absolute expiry in Unix epoch seconds, the unit DynamoDB TTL expects.
pub fn ttl_epoch_seconds(now: DateTime<Utc>, retention: Duration) -> i64 {
    (now + retention).timestamp()
}
