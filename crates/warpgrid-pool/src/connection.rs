//! Connection backend traits and identities.
//!
//! The pool never speaks a wire protocol itself. It only needs to open and
//! close connections, ask them a few yes/no questions for status reports,
//! and run a trivial probe query for keepalive. Drivers implement
//! [`ConnectionFactory`] and [`Connection`]; tests inject mocks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Credentials;

/// Stable identity of a pooled connection.
///
/// Assigned once at creation and used for all identity-based lookups. The
/// nil UUID is never assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil identity. Never held by the pool.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A live connection owned by the pool.
///
/// Methods take `&self`: a reserved connection is used by its caller while
/// the keepalive task may probe it concurrently, so implementations use
/// interior mutability.
#[async_trait]
pub trait Connection: Send + Sync + std::fmt::Debug {
    /// Close the underlying transport.
    async fn close(&self) -> Result<(), String>;

    fn is_closed(&self) -> bool;

    fn is_read_only(&self) -> bool;

    /// Check liveness, giving up after `timeout`.
    async fn is_valid(&self, timeout: Duration) -> bool;

    /// Run a trivial query whose only purpose is to keep the session alive.
    async fn execute_probe(&self, query: &str) -> Result<(), String>;
}

/// Factory for creating new connections — injected for testability.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Establish a new connection to `address`.
    async fn open(
        &self,
        address: &str,
        credentials: &Credentials,
    ) -> Result<Arc<dyn Connection>, String>;
}
