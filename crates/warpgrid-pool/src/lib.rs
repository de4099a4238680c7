//! warpgrid-pool — bounded pool of reusable network connections.
//!
//! Creates connections lazily up to a minimum, hands them out under a
//! reservation protocol, reclaims them on release, evicts ones that sat idle
//! too long and keeps the rest alive with periodic probes.
//!
//! # Architecture
//!
//! ```text
//! Pool
//!   ├── PoolState (one tokio Mutex)
//!   │   ├── available: VecDeque<PooledConnection>
//!   │   ├── reserved:  VecDeque<PooledConnection>
//!   │   └── SelectionPolicy (shuffle | in-order)
//!   ├── reaper::evict_idle()      — first step of every reserve()
//!   ├── KeepaliveTask per record  — canceled on close/drop
//!   └── Arc<dyn ConnectionFactory>
//! ```
//!
//! The pool never speaks a wire protocol: drivers plug in through
//! [`ConnectionFactory`] and [`Connection`]. [`tcp::TcpConnectionFactory`]
//! is a plain-TCP backend used by `warpgrid-poolctl` and the integration
//! tests.

pub mod config;
pub mod connection;
pub mod error;
pub mod keepalive;
pub mod pool;
mod reaper;
pub mod selection;
pub mod status;
pub mod tcp;

pub use config::{Credentials, KeepaliveConfig, PoolConfig};
pub use connection::{Connection, ConnectionFactory, ConnectionId};
pub use error::{PoolError, PoolResult};
pub use pool::{Lease, Pool};
pub use selection::SelectionPolicy;
pub use status::{ConnectionStatus, PoolStatus};
