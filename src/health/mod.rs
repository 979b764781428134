//! Database health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (monitor.rs)
//!     → ProbeRunner::probe (database/probe.rs)
//!     → RetryState decides: reset, retry after delay, or escalate (state.rs)
//!     → HealthReport updated for /health
//!     → on escalation: ShutdownCoordinator (lifecycle/shutdown.rs)
//! ```
//!
//! # Design Decisions
//! - A single monitor per process; its cycles never overlap
//! - The retry delay only suspends the monitor task, never query traffic
//! - "No pool" and "query failed" share one failure path

pub mod monitor;
pub mod state;

pub use monitor::HealthMonitor;
pub use state::{HealthReport, HealthSnapshot, HealthStatus, MonitorState, RetryState};
