//! Nanosecond ticks used to anchor the search
//!
//! The target generator folds a nanosecond timestamp into its seed, so the
//! anchor handed to the engine must come from the target's own clock.
//!
//! [`nano_time`] counts from the Unix epoch. It is only a valid anchor for
//! targets seeded from this same function, as the demo binary does. A JVM
//! seeds from `System.nanoTime()`, a monotonic clock with an arbitrary
//! origin, so for a real JVM target the caller must take the anchor from that
//! process (or recover it with [`extract_tick`] from a known generator).

use crate::prng::{scramble, MASK};
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds since the Unix epoch.
///
/// Falls back to 0 for clocks set before the epoch.
pub fn nano_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

/// Recover the tick a freshly constructed generator was seeded from, given
/// its scrambled internal `state` and the `uniquifier` it consumed.
///
/// Only the low 48 bits survive the constructor scramble.
pub fn extract_tick(state: i64, uniquifier: i64) -> i64 {
    (scramble(state) ^ uniquifier) & MASK
}

/// How many ticks before `now` a generator with initial `state` was created,
/// assuming it used `uniquifier`. Negative when it was created after `now`.
pub fn creation_offset(state: i64, uniquifier: i64, now: i64) -> i64 {
    let created = extract_tick(state, uniquifier);
    let now = now & MASK;
    let diff = (now - created) & MASK;
    // Re-centre the 48-bit difference around zero
    if diff >= 1 << 47 {
        diff - (1 << 48)
    } else {
        diff
    }
}
