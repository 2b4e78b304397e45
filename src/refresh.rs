use std::fmt::Display;
use std::future::Future;

/// A `Refresh` is a type with a method [`Refresh::fetch`] that maps a key to a value asynchronously
///
/// Returning `None` means there is nothing to cache for this key, the cache is left untouched
/// and the caller of [`crate::StaleCache::get`] sees `None`.
pub trait Refresh<K, V> {
    fn fetch(&self, key: K) -> impl Future<Output = Option<V>> + Send;
}

impl<K, V, F, Fut> Refresh<K, V> for F
where
    F: Fn(K) -> Fut,
    Fut: Future<Output = Option<V>> + Send,
{
    fn fetch(&self, key: K) -> impl Future<Output = Option<V>> + Send {
        self(key)
    }
}

/// Adapts a fetcher that can fail into a [`Refresh`]
///
/// The cache has no way to surface or retry a failed fetch, so errors are logged and treated as "no value".
///
/// ```
/// # use stale_cache::refresh::{Fallible, Refresh};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let lookup = Fallible::new(|id: u32| async move {
///     if id == 0 {
///         Err("no such user")
///     } else {
///         Ok(format!("user-{id}"))
///     }
/// });
///
/// assert_eq!(lookup.fetch(1).await.as_deref(), Some("user-1"));
/// assert_eq!(lookup.fetch(0).await, None);
/// # }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Fallible<F>(F);

impl<F> Fallible<F> {
    pub fn new(fetch: F) -> Self {
        Fallible(fetch)
    }

    pub fn into_inner(self) -> F {
        self.0
    }
}

impl<K, V, E, F, Fut> Refresh<K, V> for Fallible<F>
where
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<V, E>> + Send,
    E: Display,
{
    fn fetch(&self, key: K) -> impl Future<Output = Option<V>> + Send {
        let fut = (self.0)(key);

        async move {
            match fut.await {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!(error = %err, "fetch failed, treating as no value");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    async fn fetch_via<R: Refresh<u32, String>>(refresh: &R, key: u32) -> Option<String> {
        refresh.fetch(key).await
    }

    #[tokio::test]
    async fn test_closure_is_a_refresh() {
        let refresh = |key: u32| async move { (key % 2 == 0).then(|| key.to_string()) };

        assert_eq!(fetch_via(&refresh, 4).await, Some("4".to_string()));
        assert_eq!(fetch_via(&refresh, 3).await, None);
    }

    #[tokio::test]
    async fn test_fallible_collapses_errors() {
        let refresh = Fallible::new(|key: u32| async move {
            if key == 7 {
                Err(format!("upstream rejected {key}"))
            } else {
                Ok(format!("value-{key}"))
            }
        });

        assert_eq!(fetch_via(&refresh, 1).await, Some("value-1".to_string()));
        assert_eq!(fetch_via(&refresh, 7).await, None);
    }
}
