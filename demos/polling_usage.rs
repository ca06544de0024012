//! Polling Cache Usage
//!
//! Shows concurrent callers sharing one factory run, refresh after the
//! time-to-live, and a short retry window after a failed run.
//!
//! Run with: cargo run --example polling_usage

use generational_cache::polling::{PollingCache, RefreshOptions};
use generational_cache::CacheRegistry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let polling = Arc::new(PollingCache::new(Arc::new(CacheRegistry::new())));

    single_flight(&polling).await?;
    refresh_after_ttl(&polling).await?;
    retry_after_failure(&polling).await?;

    Ok(())
}

/// Ten tasks ask for the same key at once; the factory runs once.
async fn single_flight(polling: &Arc<PollingCache>) -> anyhow::Result<()> {
    println!("🔄 Single flight");
    let runs = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let polling = Arc::clone(polling);
            let runs = Arc::clone(&runs);
            tokio::spawn(async move {
                polling
                    .get_or_refresh(
                        "exchange-rates".to_string(),
                        move |key| {
                            runs.fetch_add(1, Ordering::SeqCst);
                            async move {
                                tokio::time::sleep(Duration::from_millis(100)).await;
                                Ok::<_, anyhow::Error>(format!("{key} @ 1.0842"))
                            }
                        },
                        RefreshOptions::new().time_to_live(Duration::from_secs(30)),
                    )
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await??;
    }
    println!(
        "   ✅ 10 callers, {} factory run(s), {:?}\n",
        runs.load(Ordering::SeqCst),
        start.elapsed()
    );
    Ok(())
}

/// Values older than their time-to-live are recomputed on the next request.
async fn refresh_after_ttl(polling: &PollingCache) -> anyhow::Result<()> {
    println!("⏱️  Refresh after time-to-live");
    let version = Arc::new(AtomicUsize::new(0));

    for _ in 0..4 {
        let version = Arc::clone(&version);
        let value = polling
            .get_or_refresh(
                "feature-flags".to_string(),
                move |_| {
                    let v = version.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, anyhow::Error>(v) }
                },
                RefreshOptions::new().time_to_live(Duration::from_millis(150)),
            )
            .await?;
        println!("   • feature-flags version {value:?}");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    println!();
    Ok(())
}

/// A failure is reported as `None`. The hook discards it, so the next request
/// runs the factory again instead of serving the failure for ten minutes.
async fn retry_after_failure(polling: &PollingCache) -> anyhow::Result<()> {
    println!("🩹 Retry after failure");
    let attempts = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let attempts = Arc::clone(&attempts);
        let options = RefreshOptions::new()
            .time_to_live(Duration::from_secs(600))
            .after_factory(|value| {
                if let Some(err) = value.exception() {
                    println!("   ⚠️  factory failed: {err}");
                    value.reset();
                    value.set_expire_after(Duration::from_secs(1));
                }
            })
            .process_result(|value| Ok(value.value().cloned()));

        let value = polling
            .get_or_refresh(
                "upstream".to_string(),
                move |_| {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if attempt == 0 {
                            anyhow::bail!("connection refused");
                        }
                        Ok(format!("payload #{attempt}"))
                    }
                },
                options,
            )
            .await?;
        println!("   • upstream -> {value:?}");
    }
    Ok(())
}
