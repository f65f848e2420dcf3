//! Expiry Sweep Task
//!
//! Background task that periodically sweeps expired cache records, for
//! sessions that stay open longer than the cache TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;

/// Spawns a task that calls [`CacheManager::cleanup_expired`] every `interval`.
///
/// The first sweep happens one interval after spawning. Abort the returned
/// handle to stop it.
pub fn spawn_cleanup_task(cache: Arc<CacheManager>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {:.1}s",
            interval.as_secs_f64()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired();
            if removed > 0 {
                info!("Cache cleanup: removed {} expired records", removed);
            } else {
                debug!("Cache cleanup: no expired records found");
            }
        }
    })
}
