use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::service::InventoryService;

/// Configuration for the background stock scan.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to scan for low stock levels (seconds).
    pub scan_interval: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { scan_interval: 3600 }
    }
}

/// Start the background low stock scan.
///
/// Re-emits `stock.low` for every level at or under its threshold, so
/// alerts are not lost when a crossing happened while the pipeline was
/// down. Returns a CancellationToken that stops the loop when cancelled.
pub fn start(service: Arc<InventoryService>, config: WorkerConfig) -> CancellationToken {
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        let interval = Duration::from_secs(config.scan_interval.max(1));

        tokio::spawn(async move {
            info!("low stock scan started (interval={interval:?})");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("low stock scan stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        debug!("low stock scan");
                        match service.scan_low_stock() {
                            Ok(0) => {}
                            Ok(n) => info!("low stock scan: {n} levels under threshold"),
                            Err(e) => error!("low stock scan error: {e}"),
                        }
                    }
                }
            }
        });
    }

    cancel
}
