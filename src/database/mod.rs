//! Database access subsystem.
//!
//! # Data Flow
//! ```text
//! Query path (client.rs):
//!     Database::query / prepared_query
//!     → cache.rs (resolve pool by fingerprint, create on first use)
//!     → pool.rs (sqlx MySqlPool)
//!
//! Health path (probe.rs):
//!     ProbeRunner::probe
//!     → cache.rs (lookup, else create)
//!     → DatabasePool::ping under a deadline
//!     → ProbeOutcome (never an error)
//! ```
//!
//! # Design Decisions
//! - One pool per distinct configuration fingerprint, for the process lifetime
//! - Creation happens under the map's shard lock, so racing callers share one pool
//! - Pool providers sit behind traits so the health machinery runs without a server

pub mod cache;
pub mod client;
pub mod error;
pub mod key;
pub mod pool;
pub mod probe;

pub use cache::PoolCache;
pub use client::{Database, SqlParam};
pub use error::DbError;
pub use key::PoolKey;
pub use pool::{DatabasePool, MySqlPoolFactory, PoolFactory};
pub use probe::{ProbeOutcome, ProbeRunner};
