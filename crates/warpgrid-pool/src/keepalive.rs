//! Keepalive scheduler — one background probe task per connection.
//!
//! Each task fires every `interval`, runs the configured probe query and
//! logs failures. It never evicts or retries: probing is purely
//! observational. The task holds only a weak reference to its connection
//! and is owned by the pooled connection record, so closing or dropping the
//! record ends the task.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::connection::{Connection, ConnectionId};

/// Owned handle to a running keepalive task.
#[derive(Debug)]
pub struct KeepaliveTask {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl KeepaliveTask {
    /// Start probing `connection` every `interval`. The first probe fires one
    /// interval after spawning.
    pub fn spawn(
        id: ConnectionId,
        connection: &Arc<dyn Connection>,
        interval: Duration,
        probe_query: String,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let connection = Arc::downgrade(connection);

        let handle = tokio::spawn(async move {
            run_keepalive_loop(id, connection, interval, probe_query, shutdown_rx).await;
        });

        Self {
            handle,
            shutdown_tx,
        }
    }

    /// Stop the task. Safe to call more than once.
    pub fn cancel(&self) {
        let _ = self.shutdown_tx.send(true);
        self.handle.abort();
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for KeepaliveTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_keepalive_loop(
    id: ConnectionId,
    connection: Weak<dyn Connection>,
    interval: Duration,
    probe_query: String,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(%id, ?interval, "keepalive loop starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(conn) = connection.upgrade() else {
                    debug!(%id, "connection dropped, keepalive loop exiting");
                    break;
                };
                if conn.is_closed() {
                    debug!(%id, "connection closed, keepalive loop exiting");
                    break;
                }
                match conn.execute_probe(&probe_query).await {
                    Ok(()) => trace!(%id, "keepalive probe ok"),
                    Err(e) => warn!(%id, error = %e, "keepalive probe failed"),
                }
            }
            _ = shutdown.changed() => {
                debug!(%id, "keepalive loop shutting down");
                break;
            }
        }
    }
}
