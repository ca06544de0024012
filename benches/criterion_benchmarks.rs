use criterion::{black_box, criterion_group, criterion_main, Criterion};
use generational_cache::config::TwoLayerCacheConfig;
use generational_cache::{ConcurrentMap, GenerationalCache};

fn make_cache<K: std::hash::Hash + Eq + Clone, V: Clone>(
    cap: usize,
    check_cold_cache_size: bool,
) -> GenerationalCache<K, V> {
    let config = TwoLayerCacheConfig::new(cap).with_cold_cache_size_check(check_cold_cache_size);
    GenerationalCache::init(config, None).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    const CACHE_SIZE: usize = 1000;
    let mut group = c.benchmark_group("Cache Operations");

    // Generational cache: every key promoted to hot
    {
        let cache = make_cache(CACHE_SIZE, false);
        for i in 0..CACHE_SIZE {
            cache.try_add(i, i);
            cache.try_get_value(&i);
        }

        group.bench_function("Generational get hot hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.try_get_value(&(i % CACHE_SIZE)));
                }
            });
        });

        group.bench_function("Generational get miss", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.try_get_value(&(i + CACHE_SIZE)));
                }
            });
        });

        group.bench_function("Generational get_or_add existing", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.get_or_add(i % CACHE_SIZE, |k| *k));
                }
            });
        });
    }

    // Generational cache: rotating key space forces swaps
    {
        let cache = make_cache(CACHE_SIZE, false);
        let mut next = 0usize;

        group.bench_function("Generational get_or_add rotating", |b| {
            b.iter(|| {
                for _ in 0..100 {
                    next = next.wrapping_add(1);
                    let key = next % (CACHE_SIZE * 4);
                    black_box(cache.get_or_add(key, |k| *k));
                    black_box(cache.try_get_value(&key));
                }
            });
        });
    }

    // Generational cache with the cold size check
    {
        let cache = make_cache(CACHE_SIZE, true);
        let mut next = 0usize;

        group.bench_function("Generational try_add with cold size check", |b| {
            b.iter(|| {
                for _ in 0..100 {
                    next = next.wrapping_add(1);
                    black_box(cache.try_add(next, next));
                }
            });
        });
    }

    // Underlying concurrent map
    {
        let map: ConcurrentMap<usize, usize> = (0..CACHE_SIZE).map(|i| (i, i)).collect();

        group.bench_function("ConcurrentMap get hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(map.get(&(i % CACHE_SIZE)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
