//! Nanosecond time source.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time in nanoseconds since the Unix epoch.
///
/// Injected wherever timings are computed so tests can pin "now".
pub trait NanoTime: Send + Sync {
    fn now_unix_nanos(&self) -> i64;
}

/// [`NanoTime`] backed by the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl NanoTime for SystemClock {
    fn now_unix_nanos(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Milliseconds elapsed between `start_nanos` and `timestamp_nanos`.
///
/// Truncates toward zero; negative when the timestamp precedes the start.
pub fn elapsed_millis(timestamp_nanos: i64, start_nanos: i64) -> i64 {
    timestamp_nanos.saturating_sub(start_nanos) / 1_000_000
}
