use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::service::GymService;

/// Configuration for the background expiry scan.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to scan membership end dates (seconds).
    pub scan_interval: u64,
    /// Memberships ending within this many days raise `membership.expiring`;
    /// memberships lapsed within it raise `membership.expired`.
    pub lead_days: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            scan_interval: 3600,
            lead_days: 7,
        }
    }
}

/// Start the background membership expiry scan.
///
/// Returns a CancellationToken that stops the loop when cancelled.
pub fn start(service: Arc<GymService>, config: WorkerConfig) -> CancellationToken {
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        let interval = Duration::from_secs(config.scan_interval.max(1));
        let lead = config.lead_days.max(0);

        tokio::spawn(async move {
            info!("membership expiry scan started (interval={interval:?}, lead={lead}d)");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("membership expiry scan stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        debug!("membership expiry scan");
                        match service.scan_expiry(lead) {
                            Ok((0, 0)) => {}
                            Ok((expiring, expired)) => {
                                info!("expiry scan: {expiring} expiring, {expired} expired")
                            }
                            Err(e) => error!("expiry scan error: {e}"),
                        }
                    }
                }
            }
        });
    }

    cancel
}
