//! Generational Cache Metrics Demonstration
//!
//! Runs the same workload against a cache with and without the cold size
//! check, then prints both metric reports side by side.
//!
//! Run with: cargo run --example metrics_demo

use generational_cache::config::TwoLayerCacheConfig;
use generational_cache::metrics::CacheMetrics;
use generational_cache::{GenerationalCache, TwoLayerCacheMetrics};
use std::collections::BTreeSet;

const CAPACITY: usize = 4;

fn main() {
    println!("🚀 Generational Cache Metrics");
    println!("=============================\n");
    println!("📊 Workload:");
    println!("   • Capacity: {CAPACITY} items per layer");
    println!("   • Add 12 keys, read a hot working set, then read every key once\n");

    let reports = vec![
        ("unchecked", run_workload(false)),
        ("cold size check", run_workload(true)),
    ];

    display_metrics_comparison(&reports);
    display_hit_rates(&reports);
}

fn run_workload(check_cold_cache_size: bool) -> TwoLayerCacheMetrics {
    let config = TwoLayerCacheConfig::new(CAPACITY).with_cold_cache_size_check(check_cold_cache_size);
    let cache = match GenerationalCache::init(config, None) {
        Ok(cache) => cache,
        Err(err) => panic!("invalid demo configuration: {err}"),
    };

    for key in 0..12u32 {
        cache.try_add(key, key * 10);
    }

    // Working set: promoted on the first read, served from hot afterwards
    for _ in 0..3 {
        for key in 8..12u32 {
            cache.try_get_value(&key);
        }
    }

    for key in 0..12u32 {
        cache.get_or_add(key, |k| k * 10);
    }

    cache.metrics()
}

fn display_metrics_comparison(reports: &[(&str, TwoLayerCacheMetrics)]) {
    println!("📈 Metrics report");
    println!("{:-<60}", "");

    let names: BTreeSet<String> = reports
        .iter()
        .flat_map(|(_, report)| report.metrics().into_keys())
        .collect();

    print!("{:<26}", "metric");
    for (label, _) in reports {
        print!("{label:>17}");
    }
    println!();

    for name in &names {
        print!("{name:<26}");
        for (_, report) in reports {
            let value = report.metrics().get(name).copied().unwrap_or_default();
            print!("{value:>17.2}");
        }
        println!();
    }
    println!();
}

fn display_hit_rates(reports: &[(&str, TwoLayerCacheMetrics)]) {
    println!("🎯 Hit rates ({})", reports[0].1.algorithm_name());
    for (label, report) in reports {
        println!(
            "   • {label}: {:.1}% ({} hits, {} swaps, {} cold evictions)",
            report.hit_rate() * 100.0,
            report.hit_count(),
            report.swap_count,
            report.cold_evictions,
        );
    }
}
