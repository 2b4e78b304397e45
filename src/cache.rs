pub mod builder;
mod in_flight;

use crate::entry::{Entry, State};
use crate::refresh::Refresh;
use crate::Config;
use builder::CacheBuilder;
use in_flight::InFlight;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::time::Instant;

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// A concurrent ttl cache that keeps serving values for a grace period after they expire,
/// refreshing them in the background.
///
/// Cloning is cheap, every clone refers to the same underlying table.
pub struct StaleCache<K, V, R> {
    pub(crate) inner: Arc<Inner<K, V, R>>,
}

impl<K, V, R> Clone for StaleCache<K, V, R> {
    fn clone(&self) -> Self {
        StaleCache {
            inner: self.inner.clone(),
        }
    }
}

pub(crate) struct Inner<K, V, R> {
    pub(crate) table: RwLock<HashMap<K, Entry<V>>>,
    pub(crate) in_flight: InFlight<K>,
    pub(crate) refresh: R,
    pub(crate) ttl: Duration,
    pub(crate) config: Config,
    pub(crate) handle: Handle,
}

enum Lookup<V> {
    Miss,
    Fresh(V),
    Stale(V),
    Expired,
}

impl<K, V, R> StaleCache<K, V, R>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    R: Refresh<K, V> + Send + Sync + 'static,
{
    /// Create a cache with the default [`Config`]
    ///
    /// # Panics
    /// If called outside of a tokio runtime, see [`CacheBuilder::handle`]
    pub fn new(refresh: R, ttl: Duration) -> Self {
        CacheBuilder::new().build(refresh, ttl)
    }

    /// Create a cache with the given [`Config`]
    ///
    /// # Panics
    /// If called outside of a tokio runtime or if `config.reap_interval` is zero
    pub fn with_config(refresh: R, ttl: Duration, config: Config) -> Self {
        CacheBuilder::new().config(config).build(refresh, ttl)
    }

    /// Start a [`CacheBuilder`] for settings beyond the config, such as the runtime handle
    pub fn builder() -> CacheBuilder {
        CacheBuilder::new()
    }

    /// Get the value for `key`, fetching it if needed
    ///
    /// - Fresh values are returned as is.
    /// - Stale values are returned as is, and a background refresh is started unless one is already running.
    /// - Missing or expired values are fetched before returning, this call waits for the fetch.
    ///
    /// Returns `None` only when the fetcher has no value for this key, in which case nothing is cached.
    pub async fn get(&self, key: K) -> Option<V> {
        let now = Instant::now();

        match self.lookup(&key, now) {
            Lookup::Fresh(value) => Some(value),
            Lookup::Stale(value) => {
                self.refresh_in_background(key, now);
                Some(value)
            }
            Lookup::Miss => {
                tracing::trace!("cache miss, fetching");
                self.fetch(key).await
            }
            Lookup::Expired => {
                tracing::trace!("entry expired, fetching");
                self.fetch(key).await
            }
        }
    }

    /// Insert a value, overwriting whatever is there. The entry is fresh for the cache's ttl.
    ///
    /// This ignores any refresh in progress for the key, which may overwrite this value when it lands.
    pub fn set(&self, key: K, value: V) {
        self.inner.set(key, value);
    }

    /// Like [`Self::set`] but only if the key is already cached, in any state
    ///
    /// Returns true if the value was written.
    pub fn replace(&self, key: K, value: V) -> bool {
        let entry = Entry::new(value, self.inner.ttl);
        let mut table = self.inner.table.write();

        match table.get_mut(&key) {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `key`, returning its value if it was present
    pub fn delete(&self, key: &K) -> Option<V> {
        self.inner.table.write().remove(key).map(|e| e.value)
    }

    /// Drop every entry.
    ///
    /// Refreshes already running are not cancelled and will insert their value into the emptied table.
    pub fn clear(&self) {
        let old = std::mem::take(&mut *self.inner.table.write());

        // dont run the destructors under the lock
        drop(old);
    }

    fn lookup(&self, key: &K, now: Instant) -> Lookup<V> {
        let table = self.inner.table.read();

        match table.get(key) {
            None => Lookup::Miss,
            Some(entry) => match entry.state(now, self.inner.config.grace_period) {
                State::Fresh => Lookup::Fresh(entry.value.clone()),
                State::Stale => Lookup::Stale(entry.value.clone()),
                State::Expired => Lookup::Expired,
            },
        }
    }

    async fn fetch(&self, key: K) -> Option<V> {
        let value = self.inner.refresh.fetch(key.clone()).await?;
        self.inner.set(key, value.clone());

        Some(value)
    }

    /// Fire and forget. There is no handle to the spawned task, a fetcher that never returns
    /// leaks its task, bounded to one new admission per key per fetch timeout.
    fn refresh_in_background(&self, key: K, now: Instant) {
        let timeout = self.inner.config.fetch_timeout;
        let Some(ticket) = self.inner.in_flight.try_admit(&key, now, timeout) else {
            tracing::trace!("refresh already in flight");
            return;
        };

        let inner = self.inner.clone();
        self.inner.handle.spawn(async move {
            let value = inner.refresh.fetch(key.clone()).await;
            inner.in_flight.finish(&key, ticket);

            match value {
                Some(value) => inner.set(key, value),
                None => tracing::debug!("background refresh returned no value, keeping stale entry"),
            }
        });
    }
}

impl<K, V, R> StaleCache<K, V, R>
where
    K: Eq + Hash,
{
    /// The number of entries in the table, including stale and expired ones not yet reaped
    pub fn len(&self) -> usize {
        self.inner.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.table.read().is_empty()
    }

    /// True if an entry exists for `key`, regardless of its state
    pub fn contains(&self, key: &K) -> bool {
        self.inner.table.read().contains_key(key)
    }

    /// The current lifecycle state of `key`, or `None` if it isnt cached
    pub fn state(&self, key: &K) -> Option<State> {
        let now = Instant::now();

        self.inner
            .table
            .read()
            .get(key)
            .map(|e| e.state(now, self.inner.config.grace_period))
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

impl<K: Eq + Hash, V, R> Inner<K, V, R> {
    pub(crate) fn set(&self, key: K, value: V) {
        let entry = Entry::new(value, self.ttl);

        // the old entry is dropped after the lock is released
        let _old = self.table.write().insert(key, entry);
    }
}
