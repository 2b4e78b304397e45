use std::time::Duration;

/// Tunables for a single [`crate::StaleCache`] instance.
///
/// The ttl is not part of the config, it is passed alongside the fetcher when the cache is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// How long after expiry an entry is still served while it is refreshed in the background.
    pub grace_period: Duration,
    /// How long a background refresh may run before another one is admitted for the same key.
    pub fetch_timeout: Duration,
    /// Time between reaper sweeps. Must be non-zero.
    pub reap_interval: Duration,
    /// Maximum number of entries a single sweep inspects.
    pub reap_batch_limit: usize,
}

impl Config {
    pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(20);
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_REAP_BATCH_LIMIT: usize = 1000;
}

impl Default for Config {
    fn default() -> Self {
        Config {
            grace_period: Self::DEFAULT_GRACE_PERIOD,
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
            reap_interval: Self::DEFAULT_REAP_INTERVAL,
            reap_batch_limit: Self::DEFAULT_REAP_BATCH_LIMIT,
        }
    }
}
