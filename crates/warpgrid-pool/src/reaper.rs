//! Idle reaper — evicts available connections idle longer than `max_idle`.
//!
//! Runs at the start of every reservation, under the pool lock, and only
//! ever looks at the available collection. Close failures are logged and
//! swallowed: background reclamation must not fail a caller's reservation.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::pool::PooledConnection;

/// Close and remove every record whose `last_idle_at` is older than
/// `now - max_idle`. Returns the number of evicted connections.
pub(crate) async fn evict_idle(
    available: &mut VecDeque<PooledConnection>,
    max_idle: Duration,
) -> usize {
    let Some(cutoff) = Instant::now().checked_sub(max_idle) else {
        return 0;
    };

    let mut evicted = 0;
    // Back to front so removals don't shift indices still to be visited.
    for index in (0..available.len()).rev() {
        if available[index].last_idle_at >= cutoff {
            continue;
        }
        let Some(conn) = available.remove(index) else {
            continue;
        };
        let id = conn.id;
        let idle_for = conn.last_idle_at.elapsed();
        match conn.close().await {
            Ok(()) => debug!(%id, ?idle_for, "evicted idle connection"),
            Err(e) => warn!(%id, ?idle_for, error = %e, "failed to close idle connection"),
        }
        evicted += 1;
    }

    if evicted > 0 {
        info!(
            evicted = evicted,
            remaining_available = available.len(),
            "reaped idle connections"
        );
    }
    evicted
}
