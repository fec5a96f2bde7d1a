//! L4 Atomic Layer: Interval arithmetic for reveal timers

use std::time::{Duration, Instant};

/// Smallest interval a reveal timer accepts
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Interval from a configured millisecond value (0 is raised to the minimum)
#[inline]
pub fn interval_from_millis(ms: u64) -> Duration {
    Duration::from_millis(ms).max(MIN_INTERVAL)
}

/// Number of ticks that have come due by `now`
///
/// The tick scheduled at `due` counts as the first one, every further
/// whole `interval` past it adds another.
#[inline]
pub fn due_ticks(due: Instant, now: Instant, interval: Duration) -> u32 {
    if now < due {
        return 0;
    }
    let interval = interval.max(MIN_INTERVAL);
    let overdue = (now - due).as_nanos() / interval.as_nanos();
    u32::try_from(overdue.saturating_add(1)).unwrap_or(u32::MAX)
}
