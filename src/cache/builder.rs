use super::{Inner, InFlight, StaleCache};
use crate::refresh::Refresh;
use crate::{reaper, Config};

use hashbrown::HashMap;
use parking_lot::RwLock;
use tokio::runtime::Handle;

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Builds a [`StaleCache`] with non-default tunables
///
/// ```
/// # use std::time::Duration;
/// # use stale_cache::CacheBuilder;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = CacheBuilder::new()
///     .grace_period(Duration::from_secs(60))
///     .reap_interval(Duration::from_secs(30))
///     .build(|key: u64| async move { Some(key * 2) }, Duration::from_secs(10));
///
/// assert_eq!(cache.get(21).await, Some(42));
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct CacheBuilder {
    pub(crate) config: Config,
    pub(crate) handle: Option<Handle>,
    pub(crate) capacity: Option<usize>,
}

impl CacheBuilder {
    pub fn new() -> Self {
        CacheBuilder {
            config: Config::default(),
            handle: None,
            capacity: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.config.grace_period = grace_period;
        self
    }

    pub fn fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.config.fetch_timeout = fetch_timeout;
        self
    }

    pub fn reap_interval(mut self, reap_interval: Duration) -> Self {
        self.config.reap_interval = reap_interval;
        self
    }

    pub fn reap_batch_limit(mut self, reap_batch_limit: usize) -> Self {
        self.config.reap_batch_limit = reap_batch_limit;
        self
    }

    /// Spawn the reaper and background refreshes on this runtime instead of the current one
    pub fn handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn estimated_size(mut self, estimated_size: usize) -> Self {
        self.capacity = Some(estimated_size);
        self
    }

    /// # Panics
    /// If the reap interval is zero, or if no [`Handle`] was given and this is called outside of a tokio runtime
    pub fn build<K, V, R>(self, refresh: R, ttl: Duration) -> StaleCache<K, V, R>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        R: Refresh<K, V> + Send + Sync + 'static,
    {
        assert!(
            !self.config.reap_interval.is_zero(),
            "reap interval must be greater than zero"
        );

        let handle = self.handle.unwrap_or_else(Handle::current);
        let table = match self.capacity {
            Some(capacity) => HashMap::with_capacity(capacity),
            None => HashMap::new(),
        };

        let inner = Arc::new(Inner {
            table: RwLock::new(table),
            in_flight: InFlight::new(),
            refresh,
            ttl,
            config: self.config,
            handle,
        });

        reaper::spawn(&inner);

        StaleCache { inner }
    }
}
