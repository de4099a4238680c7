//! Reservation engine — the pool itself.
//!
//! Connections live in exactly one of two collections:
//!
//! ```text
//! available (front = next to serve) ──reserve()──▶ reserved (front = newest)
//!           ▲                                          │
//!           └────────────────release()─────────────────┘
//! ```
//!
//! Every operation takes the single pool lock for its whole
//! read-modify-write sequence, including connection creation, so two
//! concurrent reservations can never both grow the pool past `max_size`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::connection::{Connection, ConnectionFactory, ConnectionId};
use crate::error::{PoolError, PoolResult};
use crate::keepalive::KeepaliveTask;
use crate::reaper;
use crate::selection::SelectionPolicy;
use crate::status::{ConnectionStatus, PoolStatus};

/// Timeout applied to each `is_valid` check made by [`Pool::status`].
pub const VALIDITY_TIMEOUT: Duration = Duration::from_millis(1000);

/// A live connection with its pool bookkeeping.
#[derive(Debug)]
pub(crate) struct PooledConnection {
    pub(crate) id: ConnectionId,
    pub(crate) connection: Arc<dyn Connection>,
    /// Present iff keepalive is enabled.
    keepalive: Option<KeepaliveTask>,
    pub(crate) created_at: Instant,
    /// Set whenever the record enters the available collection.
    pub(crate) last_idle_at: Instant,
}

impl PooledConnection {
    pub(crate) fn new(
        id: ConnectionId,
        connection: Arc<dyn Connection>,
        keepalive: Option<KeepaliveTask>,
    ) -> Self {
        let now = Instant::now();
        Self {
            id,
            connection,
            keepalive,
            created_at: now,
            last_idle_at: now,
        }
    }

    fn lease(&self) -> Lease {
        Lease {
            id: self.id,
            connection: Arc::clone(&self.connection),
        }
    }

    /// Stop the keepalive task, then close the connection.
    pub(crate) async fn close(self) -> PoolResult<()> {
        if let Some(task) = &self.keepalive {
            task.cancel();
        }
        let id = self.id;
        self.connection
            .close()
            .await
            .map_err(|e| PoolError::Close(format!("connection {id}: {e}")))
    }
}

/// A reserved connection as seen by the caller.
///
/// Hand it back with [`Pool::release`]. Cloning a lease does not reserve
/// anything; the pool tracks reservations by [`ConnectionId`].
#[derive(Clone, Debug)]
pub struct Lease {
    id: ConnectionId,
    connection: Arc<dyn Connection>,
}

impl Lease {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }
}

/// Both collections plus the selection policy, guarded by one lock.
#[derive(Debug)]
struct PoolState {
    available: VecDeque<PooledConnection>,
    reserved: VecDeque<PooledConnection>,
    selector: SelectionPolicy,
}

impl PoolState {
    fn total(&self) -> usize {
        self.available.len() + self.reserved.len()
    }
}

/// A bounded pool of connections to a single target.
///
/// Share it as `Arc<Pool>`; every method takes `&self`.
pub struct Pool {
    config: PoolConfig,
    factory: Arc<dyn ConnectionFactory>,
    state: Mutex<PoolState>,
}

impl Pool {
    /// Create an empty pool with random selection. Call [`Pool::initialize`]
    /// to open the first `min_size` connections.
    pub fn new(config: PoolConfig, factory: Arc<dyn ConnectionFactory>) -> PoolResult<Self> {
        Self::with_selector(config, factory, SelectionPolicy::random())
    }

    /// Create an empty pool with an explicit selection policy.
    pub fn with_selector(
        config: PoolConfig,
        factory: Arc<dyn ConnectionFactory>,
        selector: SelectionPolicy,
    ) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            factory,
            state: Mutex::new(PoolState {
                available: VecDeque::new(),
                reserved: VecDeque::new(),
                selector,
            }),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Open connections until the pool holds `min_size` of them.
    ///
    /// If any creation fails, every connection opened by this call is closed
    /// again and the pool is left as it was.
    pub async fn initialize(&self) -> PoolResult<()> {
        let mut state = self.state.lock().await;
        let missing = self.config.min_size.saturating_sub(state.total());

        let fresh = self
            .open_batch(missing)
            .await
            .map_err(PoolError::Initialization)?;
        state.available.extend(fresh);

        info!(
            address = %self.config.address,
            available = state.available.len(),
            min_size = self.config.min_size,
            max_size = self.config.max_size,
            "connection pool initialized"
        );
        Ok(())
    }

    /// Reserve a connection.
    ///
    /// Evicts idle connections, reorders the available collection with the
    /// selection policy, restores the `min_size` floor, then serves the front
    /// of the available collection. With nothing available the pool grows by
    /// one connection if fewer than `max_size` are reserved.
    pub async fn reserve(&self) -> PoolResult<Lease> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if let Some(max_idle) = self.config.max_idle() {
            reaper::evict_idle(&mut state.available, max_idle).await;
        }

        state.selector.arrange(&mut state.available);

        let total = state.total();
        if total < self.config.min_size {
            let fresh = self
                .open_batch(self.config.min_size - total)
                .await
                .map_err(PoolError::Connection)?;
            debug!(created = fresh.len(), "topped up pool to min_size");
            for conn in fresh {
                state.available.push_front(conn);
            }
        }

        if let Some(conn) = state.available.pop_front() {
            let lease = conn.lease();
            state.reserved.push_front(conn);
            debug!(
                id = %lease.id,
                available = state.available.len(),
                reserved = state.reserved.len(),
                "reserved pooled connection"
            );
            return Ok(lease);
        }

        if state.reserved.len() < self.config.max_size {
            let conn = self
                .open_connection()
                .await
                .map_err(PoolError::Connection)?;
            let lease = conn.lease();
            state.reserved.push_front(conn);
            debug!(
                id = %lease.id,
                reserved = state.reserved.len(),
                "reserved new connection"
            );
            return Ok(lease);
        }

        debug!(
            reserved = state.reserved.len(),
            max_size = self.config.max_size,
            "pool exhausted"
        );
        Err(PoolError::Exhausted)
    }

    /// Return a reserved connection to the front of the available collection.
    pub async fn release(&self, lease: &Lease) -> PoolResult<()> {
        self.release_id(lease.id).await
    }

    /// Release by identity.
    ///
    /// Fails with [`PoolError::InvalidConnection`] for the nil identity and
    /// for any identity not currently reserved, including a second release
    /// of the same connection. A connection that reports itself closed is
    /// discarded instead of being made available again.
    pub async fn release_id(&self, id: ConnectionId) -> PoolResult<()> {
        if id.is_nil() {
            return Err(PoolError::InvalidConnection(
                "connection has no identity".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        let position = state.reserved.iter().position(|c| c.id == id);
        let Some(mut conn) = position.and_then(|pos| state.reserved.remove(pos)) else {
            return Err(PoolError::InvalidConnection(format!(
                "connection {id} is not reserved"
            )));
        };

        if conn.connection.is_closed() {
            debug!(%id, "discarding closed connection on release");
            if let Err(e) = conn.close().await {
                warn!(%id, error = %e, "failed to close released connection");
            }
            return Ok(());
        }

        conn.last_idle_at = Instant::now();
        state.available.push_front(conn);
        debug!(
            %id,
            available = state.available.len(),
            reserved = state.reserved.len(),
            "released connection to pool"
        );
        Ok(())
    }

    /// Close every connection and empty both collections.
    ///
    /// Individual close failures are logged and do not stop the remaining
    /// closes. Returns the number of connections whose close failed.
    pub async fn purge(&self) -> usize {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let drained: Vec<PooledConnection> = state
            .available
            .drain(..)
            .chain(state.reserved.drain(..))
            .collect();

        let total = drained.len();
        let mut failed = 0;
        for conn in drained {
            let id = conn.id;
            if let Err(e) = conn.close().await {
                failed += 1;
                warn!(%id, error = %e, "failed to close connection during purge");
            }
        }

        info!(
            address = %self.config.address,
            closed = total - failed,
            failed = failed,
            "connection pool purged"
        );
        failed
    }

    /// Snapshot both collections. Does not modify the pool.
    ///
    /// Membership is captured under the pool lock; the liveness checks run
    /// after it is released so a slow connection cannot stall the pool.
    pub async fn status(&self) -> PoolStatus {
        let (available_handles, reserved_handles) = {
            let state = self.state.lock().await;
            (handles(&state.available), handles(&state.reserved))
        };

        let mut available = Vec::with_capacity(available_handles.len());
        for (id, conn) in &available_handles {
            available.push(connection_status(*id, conn).await);
        }
        let mut reserved = Vec::with_capacity(reserved_handles.len());
        for (id, conn) in &reserved_handles {
            reserved.push(connection_status(*id, conn).await);
        }

        PoolStatus {
            available_count: available.len(),
            reserved_count: reserved.len(),
            available,
            reserved,
        }
    }

    /// Log pool statistics at `tracing::info` level.
    pub async fn log_stats(&self) {
        let state = self.state.lock().await;
        let oldest = state
            .available
            .iter()
            .chain(state.reserved.iter())
            .map(|c| c.created_at.elapsed())
            .max();
        info!(
            address = %self.config.address,
            available = state.available.len(),
            reserved = state.reserved.len(),
            min_size = self.config.min_size,
            max_size = self.config.max_size,
            oldest_connection = ?oldest,
            "pool statistics"
        );
    }

    /// Open `count` connections, closing the ones already opened if a later
    /// one fails.
    async fn open_batch(&self, count: usize) -> Result<Vec<PooledConnection>, String> {
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            match self.open_connection().await {
                Ok(conn) => batch.push(conn),
                Err(e) => {
                    for conn in batch {
                        let id = conn.id;
                        if let Err(close_err) = conn.close().await {
                            warn!(%id, error = %close_err, "failed to close connection from failed batch");
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(batch)
    }

    /// The single creation path: bounded factory call, identity assignment
    /// and keepalive start. Callers hold the pool lock.
    async fn open_connection(&self) -> Result<PooledConnection, String> {
        let open = self
            .factory
            .open(&self.config.address, &self.config.credentials);
        let connection = match tokio::time::timeout(self.config.connect_timeout(), open).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(format!(
                    "connect to {} timed out after {:?}",
                    self.config.address,
                    self.config.connect_timeout()
                ));
            }
        };

        let id = ConnectionId::new();
        let keepalive = self.config.keepalive.enabled.then(|| {
            KeepaliveTask::spawn(
                id,
                &connection,
                self.config.keepalive.interval(),
                self.config.keepalive.probe_query.clone(),
            )
        });

        debug!(
            %id,
            address = %self.config.address,
            keepalive = keepalive.is_some(),
            "created new connection"
        );
        Ok(PooledConnection::new(id, connection, keepalive))
    }
}

fn handles(records: &VecDeque<PooledConnection>) -> Vec<(ConnectionId, Arc<dyn Connection>)> {
    records
        .iter()
        .map(|c| (c.id, Arc::clone(&c.connection)))
        .collect()
}

async fn connection_status(id: ConnectionId, conn: &Arc<dyn Connection>) -> ConnectionStatus {
    ConnectionStatus {
        id,
        closed: conn.is_closed(),
        read_only: conn.is_read_only(),
        valid: conn.is_valid(VALIDITY_TIMEOUT).await,
    }
}

// ── Debug impl (cannot auto-derive due to dyn trait) ────────────────

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
