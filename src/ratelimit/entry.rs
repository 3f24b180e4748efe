//! Per-key fixed-window counter state.

use std::time::{Duration, Instant};

/// Counter state for a single tracked key.
///
/// An entry is only ever read or mutated while the caller holds the entry
/// map's exclusive guard for its key, so plain fields suffice.
#[derive(Debug, Clone)]
pub struct WindowEntry {
    /// Admitted requests in the current window
    count: u32,
    /// When the current window started
    window_start: Instant,
    /// Most recent admission check, admitted or rejected
    last_accessed: Instant,
}

impl WindowEntry {
    /// Create a fresh entry whose window starts now.
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
            last_accessed: now,
        }
    }

    /// Run one admission check against this entry.
    ///
    /// Resets the counter if the window has expired, stamps the access time,
    /// and returns `true` if the request is admitted under `limit`. The
    /// window is aligned to first use or last reset, not sliding, so a burst
    /// straddling a window boundary can admit up to `2 * limit - 1` requests.
    pub fn admit(&mut self, now: Instant, limit: u32, window: Duration) -> bool {
        if now.saturating_duration_since(self.window_start) >= window {
            self.count = 0;
            self.window_start = now;
        }

        self.last_accessed = now;

        if self.count < limit {
            self.count += 1;
            true
        } else {
            false
        }
    }

    /// Admitted requests in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Quota left in the current window.
    pub fn remaining(&self, limit: u32) -> u32 {
        limit.saturating_sub(self.count)
    }

    /// How long this key has gone without an admission check.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_accessed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u32 = 5;
    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_admits_up_to_limit() {
        let now = Instant::now();
        let mut entry = WindowEntry::new(now);

        for _ in 0..LIMIT {
            assert!(entry.admit(now, LIMIT, WINDOW));
        }

        assert!(!entry.admit(now, LIMIT, WINDOW));
        assert_eq!(entry.count(), LIMIT);
        assert_eq!(entry.remaining(LIMIT), 0);
    }

    #[test]
    fn test_rejection_leaves_count_unchanged() {
        let now = Instant::now();
        let mut entry = WindowEntry::new(now);

        for _ in 0..LIMIT {
            entry.admit(now, LIMIT, WINDOW);
        }
        for _ in 0..10 {
            assert!(!entry.admit(now, LIMIT, WINDOW));
        }

        assert_eq!(entry.count(), LIMIT);
    }

    #[test]
    fn test_window_expiry_restarts_count() {
        let start = Instant::now();
        let mut entry = WindowEntry::new(start);

        for _ in 0..=LIMIT {
            entry.admit(start, LIMIT, WINDOW);
        }

        let later = start + Duration::from_secs(61);
        assert!(entry.admit(later, LIMIT, WINDOW));
        assert_eq!(entry.count(), 1);
    }

    #[test]
    fn test_window_expiry_boundary_is_inclusive() {
        let start = Instant::now();
        let mut entry = WindowEntry::new(start);

        for _ in 0..LIMIT {
            entry.admit(start, LIMIT, WINDOW);
        }

        // Elapsed exactly equal to the window length resets it.
        let boundary = start + WINDOW;
        assert!(entry.admit(boundary, LIMIT, WINDOW));
        assert_eq!(entry.count(), 1);
    }

    #[test]
    fn test_rejected_check_still_stamps_access_time() {
        let start = Instant::now();
        let mut entry = WindowEntry::new(start);

        for _ in 0..LIMIT {
            entry.admit(start, LIMIT, WINDOW);
        }

        let later = start + Duration::from_secs(30);
        assert!(!entry.admit(later, LIMIT, WINDOW));
        assert_eq!(entry.idle_for(later), Duration::ZERO);
    }

    #[test]
    fn test_idle_for_measures_from_last_check() {
        let start = Instant::now();
        let mut entry = WindowEntry::new(start);

        entry.admit(start + Duration::from_secs(10), LIMIT, WINDOW);

        let now = start + Duration::from_secs(70);
        assert_eq!(entry.idle_for(now), Duration::from_secs(60));
    }
}
