//! Pool status snapshot types.

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionId;

/// Point-in-time state of one pooled connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub id: ConnectionId,
    pub closed: bool,
    pub read_only: bool,
    /// Result of a liveness check bounded by [`VALIDITY_TIMEOUT`](crate::pool::VALIDITY_TIMEOUT).
    pub valid: bool,
}

/// Read-only snapshot of both pool collections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    pub available_count: usize,
    pub reserved_count: usize,
    /// In serving order (front first).
    pub available: Vec<ConnectionStatus>,
    /// Most recently reserved first.
    pub reserved: Vec<ConnectionStatus>,
}

impl PoolStatus {
    pub fn total(&self) -> usize {
        self.available_count + self.reserved_count
    }

    /// Connections that failed their liveness check or report closed.
    pub fn unhealthy(&self) -> usize {
        self.available
            .iter()
            .chain(self.reserved.iter())
            .filter(|c| c.closed || !c.valid)
            .count()
    }
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "available: {}  reserved: {}",
            self.available_count, self.reserved_count
        )?;
        let rows = self
            .available
            .iter()
            .map(|c| ("available", c))
            .chain(self.reserved.iter().map(|c| ("reserved", c)));
        for (state, conn) in rows {
            writeln!(
                f,
                "  {:<9} {}  closed={} read_only={} valid={}",
                state, conn.id, conn.closed, conn.read_only, conn.valid
            )?;
        }
        Ok(())
    }
}
