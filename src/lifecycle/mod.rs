//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal or escalation → Stop accepting → Drain → Close pools → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close pools
//! - Drain has a deadline: in-flight work is abandoned after it
//! - Escalation exits with status 0 and leaves restarts to the supervisor

pub mod shutdown;
pub mod signals;

pub use shutdown::{ProcessExit, Shutdown, ShutdownCoordinator, SystemExit};
