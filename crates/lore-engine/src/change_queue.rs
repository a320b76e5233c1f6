//! Coalescing intake for change notifications.
//!
//! Watchers and agents fire notifications faster than maintenance can
//! run. The queue holds one pending entry per path: a repeat refreshes
//! the debounce window and bumps a counter instead of queueing again.
//! Past the configured threshold repeats stop refreshing the window
//! too, so a notification storm cannot postpone draining forever.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// One queued re-extraction, however many notifications produced it.
#[derive(Debug, Clone)]
struct PendingChange {
    first_seen: Instant,
    last_seen: Instant,
    notifications: u64,
}

pub struct ChangeQueue {
    pending: DashMap<String, PendingChange>,
    /// Queue length at which repeats stop refreshing their windows.
    threshold: usize,
    collapsed: AtomicU64,
}

impl ChangeQueue {
    pub fn new(threshold: usize) -> Self {
        Self {
            pending: DashMap::new(),
            threshold,
            collapsed: AtomicU64::new(0),
        }
    }

    /// Note a changed path. Returns true when this created a new entry,
    /// false when it coalesced into one already queued.
    ///
    /// New paths always enter, even past the threshold; dropping a
    /// first notification would lose the change outright.
    pub fn notify(&self, path: &str) -> bool {
        // len() locks shards, so read it before entry() holds one.
        let saturated = self.pending.len() >= self.threshold;
        let now = Instant::now();
        match self.pending.entry(path.to_string()) {
            Entry::Occupied(mut occupied) => {
                let change = occupied.get_mut();
                change.notifications += 1;
                if saturated {
                    self.collapsed.fetch_add(1, Ordering::Relaxed);
                } else {
                    change.last_seen = now;
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingChange {
                    first_seen: now,
                    last_seen: now,
                    notifications: 1,
                });
                true
            }
        }
    }

    /// Remove and return the paths that have been quiet for `debounce`,
    /// oldest first. Paths still inside their window stay queued, as
    /// does anything notified again between the scan and the removal.
    pub fn drain_ready(&self, debounce: Duration) -> Vec<String> {
        let now = Instant::now();
        let mut candidates: Vec<(Instant, String)> = self
            .pending
            .iter()
            .filter(|entry| now.duration_since(entry.value().last_seen) >= debounce)
            .map(|entry| (entry.value().first_seen, entry.key().clone()))
            .collect();
        candidates.sort();

        let mut drained = Vec::with_capacity(candidates.len());
        for (_, path) in candidates {
            let removed = self
                .pending
                .remove_if(&path, |_, change| {
                    now.duration_since(change.last_seen) >= debounce
                })
                .is_some();
            if removed {
                drained.push(path);
            }
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Notifications dropped without refreshing a window, cumulative.
    pub fn collapsed(&self) -> u64 {
        self.collapsed.load(Ordering::Relaxed)
    }

    /// How many notifications the queued entry for `path` has absorbed.
    pub fn notification_count(&self, path: &str) -> Option<u64> {
        self.pending.get(path).map(|entry| entry.value().notifications)
    }
}
