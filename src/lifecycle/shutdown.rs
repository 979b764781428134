//! Shutdown coordination for the service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time;
use tracing::Level;

use crate::database::{PoolCache, PoolFactory};
use crate::observability::logging::{LogTag, StatusSink};
use crate::observability::metrics;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Debug, Clone)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminates the process.
pub trait ProcessExit: Send + Sync {
    fn exit(&self, code: i32);
}

/// Exits through [`std::process::exit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExit;

impl ProcessExit for SystemExit {
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Hard stop used when the database stays unreachable.
///
/// Closes the listening interface, waits up to the drain deadline for
/// in-flight requests, closes every pool and exits with status 0 so an
/// external supervisor restarts the process.
pub struct ShutdownCoordinator<F: PoolFactory> {
    shutdown: Shutdown,
    server_closed: watch::Receiver<bool>,
    pools: Arc<PoolCache<F>>,
    sink: Arc<dyn StatusSink>,
    exit: Arc<dyn ProcessExit>,
    drain_timeout: Duration,
    fired: AtomicBool,
}

impl<F: PoolFactory> ShutdownCoordinator<F> {
    pub fn new(
        shutdown: Shutdown,
        server_closed: watch::Receiver<bool>,
        pools: Arc<PoolCache<F>>,
        sink: Arc<dyn StatusSink>,
        exit: Arc<dyn ProcessExit>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            shutdown,
            server_closed,
            pools,
            sink,
            exit,
            drain_timeout,
            fired: AtomicBool::new(false),
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has already run.
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Stop accepting work, clean up and exit. Runs at most once.
    pub async fn shutdown(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            tracing::debug!("Shutdown already in progress");
            return;
        }
        metrics::record_shutdown();

        self.shutdown.trigger();

        let mut closed = self.server_closed.clone();
        // A dropped sender means the server task is already gone.
        let drained = time::timeout(self.drain_timeout, closed.wait_for(|closed| *closed))
            .await
            .is_ok();
        if !drained {
            tracing::warn!(
                drain_timeout_secs = self.drain_timeout.as_secs(),
                "Drain deadline elapsed, abandoning in-flight requests"
            );
        }

        self.sink.record(
            Level::INFO,
            LogTag::Shutdown,
            "Server closed. No longer accepting connections.",
        );

        self.pools.close_all().await;

        self.exit.exit(0);
    }
}
