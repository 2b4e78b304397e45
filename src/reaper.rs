use crate::cache::Inner;
use crate::entry::{Entry, State};

use hashbrown::HashMap;
use parking_lot::RwLock;
use tokio::time::Instant;

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Start the reaper for a cache.
///
/// The task only holds a weak reference, it exits on the first wake up after every handle to the cache is gone.
pub(crate) fn spawn<K, V, R>(inner: &Arc<Inner<K, V, R>>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    let cache = Arc::downgrade(inner);
    let interval = inner.config.reap_interval;

    inner.handle.spawn(async move {
        let mut reaper = Reaper::new();

        loop {
            tokio::time::sleep(interval).await;

            let Some(inner) = cache.upgrade() else {
                tracing::trace!("cache dropped, stopping reaper");
                return;
            };

            let evicted = reaper.sweep(
                &inner.table,
                Instant::now(),
                inner.config.grace_period,
                inner.config.reap_batch_limit,
            );

            if evicted > 0 {
                tracing::debug!(
                    evicted,
                    remaining = inner.table.read().len(),
                    "reaped expired entries"
                );
            }
        }
    });
}

/// Sweep state carried between cycles.
///
/// Hash table iteration order is stable while the table is unchanged, so a bounded scan that always
/// started at the front would keep missing the same entries. Instead each sweep picks up where the
/// last one stopped and wraps around. Removals shift positions, so coverage is eventual rather than
/// exact: an unchanged table is fully inspected every `ceil(len / limit)` sweeps.
///
/// Hash map iterators cannot seek, so reaching the cursor walks past the skipped entries under the
/// read lock. Those are not inspected, but a sweep still costs `O(len)` pointer steps on top of the
/// `O(limit)` state checks.
pub(crate) struct Reaper<K> {
    cursor: usize,
    victims: Vec<K>,
}

impl<K: Eq + Hash + Clone> Reaper<K> {
    pub(crate) fn new() -> Self {
        Reaper {
            cursor: 0,
            victims: Vec::new(),
        }
    }

    /// Inspect up to `limit` entries and remove the expired ones, returns how many were removed
    pub(crate) fn sweep<V>(
        &mut self,
        table: &RwLock<HashMap<K, Entry<V>>>,
        now: Instant,
        grace: Duration,
        limit: usize,
    ) -> usize {
        {
            let table = table.read();
            let len = table.len();

            if len == 0 || limit == 0 {
                self.cursor = 0;
                return 0;
            }

            if self.cursor >= len {
                self.cursor = 0;
            }

            let scanned = limit.min(len);
            let victims = table
                .iter()
                .skip(self.cursor)
                .chain(table.iter())
                .take(scanned)
                .filter(|(_, entry)| entry.state(now, grace) == State::Expired)
                .map(|(key, _)| key.clone());

            self.victims.extend(victims);
            self.cursor = (self.cursor + scanned) % len;
        }

        if self.victims.is_empty() {
            return 0;
        }

        let mut table = table.write();
        let mut evicted = 0;

        for key in self.victims.drain(..) {
            // the entry may have been replaced between the scan and taking the write lock
            let still_expired = table
                .get(&key)
                .is_some_and(|entry| entry.state(now, grace) == State::Expired);

            if still_expired {
                table.remove(&key);
                evicted += 1;
            }
        }

        evicted
    }
}
