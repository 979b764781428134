//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Provide the status sink the health monitor reports through
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - The monitor depends on [`StatusSink`], never on a concrete backend

use std::fmt;

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("account_service={level},tower_http={level}").into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Category attached to an operator status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    Info,
    Connection,
    Retry,
    Shutdown,
}

impl LogTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::Info => "INFO",
            LogTag::Connection => "Connection",
            LogTag::Retry => "Retry",
            LogTag::Shutdown => "Shutdown",
        }
    }
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for operator-facing status lines.
pub trait StatusSink: Send + Sync {
    fn record(&self, level: Level, tag: LogTag, message: &str);
}

/// Forwards status lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn record(&self, level: Level, tag: LogTag, message: &str) {
        match level {
            Level::ERROR => tracing::error!(category = %tag, "{}", message),
            Level::WARN => tracing::warn!(category = %tag, "{}", message),
            Level::INFO => tracing::info!(category = %tag, "{}", message),
            Level::DEBUG => tracing::debug!(category = %tag, "{}", message),
            _ => tracing::trace!(category = %tag, "{}", message),
        }
    }
}
