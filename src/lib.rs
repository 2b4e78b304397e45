//! An async ttl cache that keeps serving values after they expire while it refreshes them.
//!
//! Every entry goes through three states:
//! - **fresh** until its ttl runs out, served as is
//! - **stale** for a grace period after that, still served, but the first read kicks off a single background refresh
//! - **expired** once the grace period is over, the next read waits for a new fetch and the reaper may evict it
//!
//! Values come from a caller supplied [`Refresh`], any `Fn(K) -> impl Future<Output = Option<V>>` works.
//!
//! # Quick Start
//! ```
//! # use std::time::Duration;
//! # use stale_cache::StaleCache;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = StaleCache::new(
//!     |user: u32| async move { Some(format!("profile for {user}")) },
//!     Duration::from_secs(60),
//! );
//!
//! assert_eq!(cache.get(7).await.as_deref(), Some("profile for 7"));
//! # }
//! ```

pub mod cache;
#[doc(inline)]
pub use cache::builder::CacheBuilder;
#[doc(inline)]
pub use cache::StaleCache;

/// Per instance tunables, grace period, fetch timeout and reaper settings.
pub mod config;
#[doc(inline)]
pub use config::Config;

mod entry;
pub use entry::State;

/// The fetcher side of the cache.
pub mod refresh;
#[doc(inline)]
pub use refresh::Refresh;

mod reaper;

#[doc(hidden)]
pub mod constants_for_benchmarking;
