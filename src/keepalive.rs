use crate::db::VideoStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Run one liveness query and log how it went
pub async fn ping_once(store: &dyn VideoStore) -> bool {
    let started = Instant::now();

    match store.ping().await {
        Ok(()) => {
            info!(
                "[keep-alive] ✅ Database is alive ({:.0} ms)",
                started.elapsed().as_secs_f64() * 1000.0
            );
            true
        }
        Err(e) => {
            error!("[keep-alive] ❌ Liveness query failed: {}", e);
            false
        }
    }
}

/// Start a background task that periodically pings the database
pub fn start_keep_alive_task(
    store: Arc<dyn VideoStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            "[keep-alive] 🫀 Starting periodic liveness task (interval: {:.1} min)",
            interval.as_secs_f64() / 60.0
        );

        loop {
            ticker.tick().await;
            ping_once(store.as_ref()).await;
        }
    })
}
