//! Plain TCP connection backend.
//!
//! [`TcpConnectionFactory`] opens a `tokio::net::TcpStream` per pooled
//! connection. The backend has no protocol awareness: a keepalive probe is
//! the query text written as one `\n`-terminated line, and liveness is a
//! short non-consuming peek.
//!
//! ```text
//! Pool::reserve() → TcpConnectionFactory::open(address)
//!   → TcpStream::connect (bounded by the pool's connect_timeout)
//!     → TcpConnection { stream, closed, probe_timeout }
//! ```
//!
//! Every operation that touches the stream is time-bounded, lock wait
//! included, so a peer that stops reading cannot wedge callers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::Credentials;
use crate::connection::{Connection, ConnectionFactory};

/// Upper bound on the peek performed by [`TcpConnection::is_valid`].
const PEEK_WINDOW: Duration = Duration::from_millis(100);

/// Default bound on writing one keepalive probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ── TcpConnection ────────────────────────────────────────────────────

/// A [`Connection`] over a plain TCP stream.
pub struct TcpConnection {
    address: String,
    stream: Mutex<TcpStream>,
    closed: AtomicBool,
    probe_timeout: Duration,
}

impl std::fmt::Debug for TcpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpConnection")
            .field("address", &self.address)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl TcpConnection {
    pub fn new(address: &str, stream: TcpStream, probe_timeout: Duration) -> Self {
        Self {
            address: address.to_string(),
            stream: Mutex::new(stream),
            closed: AtomicBool::new(false),
            probe_timeout,
        }
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn close(&self) -> Result<(), String> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut stream = self.stream.lock().await;
        stream
            .shutdown()
            .await
            .map_err(|e| format!("tcp shutdown {}: {e}", self.address))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn is_read_only(&self) -> bool {
        false
    }

    async fn is_valid(&self, timeout: Duration) -> bool {
        if self.is_closed() {
            return false;
        }
        let deadline = Instant::now() + timeout;

        // A probe stuck mid-write holds the stream; treat that as unhealthy.
        let Ok(stream) = tokio::time::timeout(timeout, self.stream.lock()).await else {
            return false;
        };

        let window = deadline.saturating_duration_since(Instant::now()).min(PEEK_WINDOW);
        let mut peek_buf = [0u8; 1];
        match tokio::time::timeout(window, stream.peek(&mut peek_buf)).await {
            // Nothing to read but the socket is still open.
            Err(_) => true,
            Ok(Ok(0)) => false, // EOF: peer closed the connection
            Ok(Ok(_)) => true,
            Ok(Err(_)) => false,
        }
    }

    async fn execute_probe(&self, query: &str) -> Result<(), String> {
        if self.is_closed() {
            return Err(format!("probe on closed connection to {}", self.address));
        }
        let send = async {
            let mut stream = self.stream.lock().await;
            stream
                .write_all(query.as_bytes())
                .await
                .map_err(|e| format!("tcp send: {e}"))?;
            stream
                .write_all(b"\n")
                .await
                .map_err(|e| format!("tcp send: {e}"))?;
            stream.flush().await.map_err(|e| format!("tcp flush: {e}"))
        };
        tokio::time::timeout(self.probe_timeout, send)
            .await
            .map_err(|_| {
                format!(
                    "probe to {} timed out after {:?}",
                    self.address, self.probe_timeout
                )
            })?
    }
}

// ── TcpConnectionFactory ─────────────────────────────────────────────

/// Factory creating plain TCP connections.
///
/// Credentials are accepted for interface compatibility and ignored: any
/// authentication belongs to the protocol spoken over the stream. The
/// connect itself is bounded by the pool, not here.
#[derive(Debug, Clone)]
pub struct TcpConnectionFactory {
    probe_timeout: Duration,
}

impl TcpConnectionFactory {
    pub fn new() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Bound each keepalive probe write by `probe_timeout` instead of
    /// [`DEFAULT_PROBE_TIMEOUT`].
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }
}

impl Default for TcpConnectionFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionFactory for TcpConnectionFactory {
    async fn open(
        &self,
        address: &str,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn Connection>, String> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| format!("tcp connect to {address}: {e}"))?;

        // Disable Nagle's algorithm so probes go out immediately.
        let _ = stream.set_nodelay(true);

        tracing::debug!(address = %address, "established tcp connection");
        Ok(Arc::new(TcpConnection::new(
            address,
            stream,
            self.probe_timeout,
        )))
    }
}
