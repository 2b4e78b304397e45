use std::time::Duration;
use tokio::time::Instant;

/// Where an [`Entry`] is in its lifecycle, relative to some instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// The entry has not reached its expiry yet.
    Fresh,
    /// Past expiry but inside the grace window, still served while a refresh runs.
    Stale,
    /// Past expiry and the grace window, must be fetched again or reaped.
    Expired,
}

/// A cached value and the instant it stops being fresh.
///
/// Entries are never mutated once they are in the table, a newer value always replaces the whole entry.
#[derive(Clone, Debug)]
pub(crate) struct Entry<V> {
    pub(crate) value: V,
    pub(crate) expires_at: Instant,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();

        Entry {
            value,
            // a ttl too large to represent never expires in practice
            expires_at: now.checked_add(ttl).unwrap_or_else(|| far_future(now)),
        }
    }

    #[inline]
    pub(crate) fn state(&self, now: Instant, grace: Duration) -> State {
        if now < self.expires_at {
            State::Fresh
        } else if now.duration_since(self.expires_at) >= grace {
            State::Expired
        } else {
            State::Stale
        }
    }
}

/// Roughly 30 years from `now`, the same horizon tokio uses for timers that never fire
fn far_future(now: Instant) -> Instant {
    now + Duration::from_secs(86400 * 365 * 30)
}
