//! Background eviction of idle entries.
//!
//! Keys that stop being checked would otherwise stay in the entry map for
//! the process lifetime. A recurring task removes entries whose last check
//! is older than the idle timeout; losing a pass only delays reclamation and
//! never affects admission decisions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

use crate::clock::Clock;

use super::limiter::EntryMap;

/// Handle owning the recurring sweep task.
///
/// Dropping the handle aborts the task; [`SweeperHandle::stop`] shuts it
/// down cooperatively.
pub(super) struct SweeperHandle {
    shutdown: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SweeperHandle {
    /// Spawn the sweep task.
    ///
    /// The first pass runs one full `interval` after spawn, then every
    /// `interval` thereafter.
    pub(super) fn spawn(
        entries: Arc<EntryMap>,
        clock: Arc<dyn Clock>,
        idle_timeout: Duration,
        interval: Duration,
    ) -> Self {
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            debug!(interval_secs = interval.as_secs(), "Eviction sweep started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = sweep_idle(&entries, clock.now(), idle_timeout);
                        if removed > 0 {
                            debug!(removed, "Swept idle rate limit entries");
                        } else {
                            trace!("Sweep pass removed no entries");
                        }
                    }
                    _ = signal.notified() => {
                        debug!("Eviction sweep stopped");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    /// Signal the task and wait for it to exit. Safe to call more than once.
    pub(super) async fn stop(&self) {
        self.shutdown.notify_one();

        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        // A cooperative stop() has already taken the handle.
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

/// One eviction pass over the entry map.
///
/// Snapshots the idle keys first, then removes each one, re-checking
/// idleness under the entry lock so a key refreshed between snapshot and
/// removal survives. Returns the number of entries removed.
pub(super) fn sweep_idle(entries: &EntryMap, now: Instant, idle_timeout: Duration) -> usize {
    let stale: Vec<String> = entries
        .iter()
        .filter(|kv| kv.value().idle_for(now) >= idle_timeout)
        .map(|kv| kv.key().clone())
        .collect();

    let mut removed = 0;
    for key in stale {
        if entries
            .remove_if(&key, |_, entry| entry.idle_for(now) >= idle_timeout)
            .is_some()
        {
            removed += 1;
        }
    }

    removed
}
