use criterion::Criterion;
use criterion::{criterion_group, criterion_main};

use moka::future::Cache;

use tokio::runtime;

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use stale_cache::constants_for_benchmarking::{GET_MANY, INSERT_MANY};

static CACHE: OnceLock<Mutex<Cache<usize, usize>>> = OnceLock::new();

fn new_cache(capacity: usize) -> Cache<usize, usize> {
    Cache::builder()
        .max_capacity(capacity as u64)
        .time_to_live(Duration::from_secs(5))
        .build()
}

async fn set_many() {
    let cache = CACHE.get().unwrap().lock().unwrap().clone();

    for i in 0..INSERT_MANY {
        cache.insert(i, i).await;
    }
}

async fn set_and_get() {
    let cache = CACHE.get().unwrap().lock().unwrap().clone();

    for i in 0..GET_MANY {
        cache.insert(i, i).await;
    }

    for i in 0..GET_MANY {
        cache.get(&i).await;
    }
}

async fn get_or_fetch_many() {
    let cache = CACHE.get().unwrap().lock().unwrap().clone();

    for i in 0..GET_MANY {
        cache.get_with(i, async { i }).await;
    }
}

fn clear_cache(capacity: usize) {
    let mut cache_ref = CACHE.get().unwrap().lock().unwrap();

    let _ = std::mem::replace(&mut *cache_ref, new_cache(capacity));
}

fn bencher(c: &mut Criterion) {
    let rt = runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    CACHE.get_or_init(|| Mutex::new(new_cache(INSERT_MANY)));

    c.bench_function("moka rs set many", |b| b.to_async(&rt).iter(set_many));

    clear_cache(GET_MANY);

    c.bench_function("moka rs set and get", |b| b.to_async(&rt).iter(set_and_get));

    clear_cache(GET_MANY);

    c.bench_function("moka rs get or fetch many", |b| {
        b.to_async(&rt).iter(get_or_fetch_many)
    });
}

criterion_group!(benches, bencher);
criterion_main!(benches);
