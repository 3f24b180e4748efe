//! Core rate limiter implementation.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimiterConfig;
use crate::error::Result;

use super::entry::WindowEntry;
use super::sweeper::{self, SweeperHandle};

/// Map from key to its window state, shared with the sweep task.
pub(super) type EntryMap = DashMap<String, WindowEntry>;

/// The core rate limiter that tracks admission counts per key.
///
/// This struct is thread-safe and can be shared across multiple tasks.
/// Construction spawns a background task that periodically evicts keys whose
/// last check is older than the configured idle timeout.
pub struct RateLimiter {
    /// Per-key window state
    entries: Arc<EntryMap>,
    /// Tunables, fixed at construction
    config: RateLimiterConfig,
    /// Time source for window and idle arithmetic
    clock: Arc<dyn Clock>,
    /// Handle to the background eviction task
    sweeper: SweeperHandle,
}

impl RateLimiter {
    /// Create a rate limiter with the system clock and start its sweep task.
    ///
    /// Fails fast if the configuration is unusable. Must be called within a
    /// tokio runtime, which the sweep task is spawned onto.
    pub fn new(config: RateLimiterConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a rate limiter with an injected time source.
    pub fn with_clock(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let entries: Arc<EntryMap> = Arc::new(DashMap::new());
        let sweeper = SweeperHandle::spawn(
            Arc::clone(&entries),
            Arc::clone(&clock),
            config.idle_timeout(),
            config.sweep_interval(),
        );

        Ok(Self {
            entries,
            config,
            clock,
            sweeper,
        })
    }

    /// Check whether a request for `key` is admitted under the current window.
    ///
    /// The read-modify-write of the key's counter runs under the entry map's
    /// exclusive per-key guard: checks for the same key observe a total
    /// order, checks for different keys do not block each other beyond the
    /// map's shard locking. Never blocks on I/O and cannot fail.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = self.clock.now();

        trace!(key = %key, "Checking rate limit");

        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| {
            debug!(key = %key, "Creating new rate limit entry");
            WindowEntry::new(now)
        });

        let admitted = entry.admit(now, self.config.limit, self.config.window());
        if !admitted {
            debug!(key = %key, "Rate limit exceeded");
        }

        admitted
    }

    /// Current counter value for `key`.
    ///
    /// Returns `None` if the key is untracked.
    pub fn current_count(&self, key: &str) -> Option<u32> {
        self.entries.get(key).map(|e| e.count())
    }

    /// Quota left in the current window for `key`.
    ///
    /// Returns `None` if the key is untracked.
    pub fn remaining(&self, key: &str) -> Option<u32> {
        self.entries.get(key).map(|e| e.remaining(self.config.limit))
    }

    /// Get the number of tracked keys.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Drop all tracked keys.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Run one eviction pass inline, returning how many entries were removed.
    ///
    /// The background task runs this on its own schedule; calling it directly
    /// only accelerates reclamation.
    pub fn sweep_idle(&self) -> usize {
        sweeper::sweep_idle(&self.entries, self.clock.now(), self.config.idle_timeout())
    }

    /// Stop the background sweep task and wait for it to exit.
    ///
    /// Admission checks keep working afterwards; only eviction stops. Safe
    /// to call more than once. Dropping the limiter without calling this
    /// aborts the task instead.
    pub async fn shutdown(&self) {
        self.sweeper.stop().await;
    }
}
