//! Background storage health check.
//!
//! A detached task pings the store on a fixed interval and logs failures.
//! It never touches in-flight requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use storage::FilmStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub struct HealthMonitor {
    healthy: Arc<AtomicBool>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Start pinging `store` every `interval`
    pub fn spawn(store: Arc<dyn FilmStore>, interval: Duration) -> Self {
        let healthy = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(ping_loop(store, interval, healthy.clone(), cancel.clone()));
        info!(interval = ?interval, "storage health check started");

        Self {
            healthy,
            cancel,
            handle: Some(handle),
        }
    }

    /// Result of the most recent ping; true until the first one fails
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                error!(error = %err, "health check task ended abnormally");
            }
        }
        info!("storage health check stopped");
    }
}

async fn ping_loop(
    store: Arc<dyn FilmStore>,
    interval: Duration,
    healthy: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match store.ping().await {
                    Ok(()) => {
                        if !healthy.swap(true, Ordering::Relaxed) {
                            info!(backend = store.backend(), "storage reachable again");
                        }
                        debug!(backend = store.backend(), "storage ping ok");
                    }
                    Err(err) => {
                        healthy.store(false, Ordering::Relaxed);
                        error!(backend = store.backend(), error = %err, "storage ping failed");
                    }
                }
            }
        }
    }
}
