use crate::manager::MinerManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Background task that refreshes every managed miner on a fixed interval.
///
/// Sweeps already tolerate per-miner failures, so the loop itself never
/// exits on error; it runs until `stop` is called or the poller is dropped.
pub struct Poller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn spawn(manager: Arc<MinerManager>, interval: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            info!(interval_secs = interval.as_secs(), "Poller started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let results = manager.refresh_all().await;
                        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
                        debug!(
                            miners = results.len(),
                            failed,
                            "Completed refresh sweep"
                        );
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("Poller stopping");
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Signal the loop to exit and wait for it to finish
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_poller_stops_cleanly() {
        let manager = Arc::new(MinerManager::new());
        let poller = Poller::spawn(manager, Duration::from_secs(60));
        poller.stop().await;
    }

    #[tokio::test]
    async fn test_poller_sweeps_empty_manager() {
        let manager = Arc::new(MinerManager::new());
        let poller = Poller::spawn(manager, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        poller.stop().await;
    }
}
