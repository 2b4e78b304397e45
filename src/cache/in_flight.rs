use hashbrown::HashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Proof that a background refresh was admitted, handed back to [`InFlight::finish`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ticket {
    started: Instant,
    id: u64,
}

/// Tracks the background refreshes that are currently running, keyed by cache key.
///
/// This is advisory bookkeeping, not a lock: once a refresh has been running longer than the
/// fetch timeout it is considered abandoned and a new one is admitted alongside it.
pub(crate) struct InFlight<K> {
    inner: Mutex<InFlightInner<K>>,
}

struct InFlightInner<K> {
    next_id: u64,
    started: HashMap<K, Ticket>,
}

impl<K> InFlight<K> {
    pub(crate) fn new() -> Self {
        InFlight {
            inner: Mutex::new(InFlightInner {
                next_id: 0,
                started: HashMap::new(),
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().started.len()
    }
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    /// Admit a refresh for `key` unless one started less than `timeout` before `now`
    pub(crate) fn try_admit(&self, key: &K, now: Instant, timeout: Duration) -> Option<Ticket> {
        let mut inner = self.inner.lock();

        if let Some(running) = inner.started.get(key) {
            if now.saturating_duration_since(running.started) <= timeout {
                return None;
            }

            tracing::trace!(
                running_for = ?now.saturating_duration_since(running.started),
                "superseding abandoned refresh"
            );
        }

        let ticket = Ticket {
            started: now,
            id: inner.next_id,
        };
        inner.next_id = inner.next_id.wrapping_add(1);
        inner.started.insert(key.clone(), ticket);

        Some(ticket)
    }

    /// Clear the record for `key`, unless a newer admission has already replaced it
    pub(crate) fn finish(&self, key: &K, ticket: Ticket) {
        let mut inner = self.inner.lock();

        if inner.started.get(key) == Some(&ticket) {
            inner.started.remove(key);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_admits_once_per_key() {
        let in_flight = InFlight::new();
        let now = Instant::now();

        assert!(in_flight.try_admit(&"a", now, TIMEOUT).is_some());
        assert!(in_flight.try_admit(&"a", now, TIMEOUT).is_none());
        assert!(in_flight
            .try_admit(&"a", now + TIMEOUT, TIMEOUT)
            .is_none());

        // other keys are independent
        assert!(in_flight.try_admit(&"b", now, TIMEOUT).is_some());
        assert_eq!(in_flight.len(), 2);
    }

    #[test]
    fn test_finish_allows_readmission() {
        let in_flight = InFlight::new();
        let now = Instant::now();

        let ticket = in_flight.try_admit(&1u64, now, TIMEOUT).unwrap();
        in_flight.finish(&1, ticket);

        assert_eq!(in_flight.len(), 0);
        assert!(in_flight.try_admit(&1, now, TIMEOUT).is_some());
    }

    #[test]
    fn test_abandoned_refresh_is_superseded() {
        let in_flight = InFlight::new();
        let now = Instant::now();

        let hung = in_flight.try_admit(&"a", now, TIMEOUT).unwrap();
        let later = now + TIMEOUT + Duration::from_millis(1);
        let fresh = in_flight.try_admit(&"a", later, TIMEOUT).unwrap();
        assert_ne!(hung, fresh);

        // the hung refresh finally returning must not erase the newer record
        in_flight.finish(&"a", hung);
        assert_eq!(in_flight.len(), 1);
        assert!(in_flight.try_admit(&"a", later, TIMEOUT).is_none());

        in_flight.finish(&"a", fresh);
        assert_eq!(in_flight.len(), 0);
    }
}
