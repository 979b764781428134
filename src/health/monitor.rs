//! Database health monitor.
//!
//! # Responsibilities
//! - Periodically probe the configured database
//! - Retry failed probes after a fixed delay, up to the retry budget
//! - Escalate to a process shutdown once the budget is spent
//! - Publish every result for the `/health` endpoint
//! - Stop mid-cycle on the shutdown signal; a graceful stop never escalates

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tracing::Level;

use crate::config::{HealthCheckConfig, MysqlConfig};
use crate::database::{PoolFactory, ProbeOutcome, ProbeRunner};
use crate::health::state::{FailureAction, HealthReport, HealthSnapshot, MonitorState, RetryState};
use crate::lifecycle::ShutdownCoordinator;
use crate::observability::logging::{LogTag, StatusSink};
use crate::observability::metrics;

pub struct HealthMonitor<F: PoolFactory> {
    probe: ProbeRunner<F>,
    target: MysqlConfig,
    config: HealthCheckConfig,
    retry: RetryState,
    state: MonitorState,
    sink: Arc<dyn StatusSink>,
    coordinator: Arc<ShutdownCoordinator<F>>,
    report: HealthReport,
    shutdown: Option<broadcast::Receiver<()>>,
}

impl<F: PoolFactory> HealthMonitor<F> {
    pub fn new(
        probe: ProbeRunner<F>,
        target: MysqlConfig,
        config: HealthCheckConfig,
        sink: Arc<dyn StatusSink>,
        coordinator: Arc<ShutdownCoordinator<F>>,
        report: HealthReport,
    ) -> Self {
        let retry = RetryState::new(config.max_retries);
        Self {
            probe,
            target,
            config,
            retry,
            state: MonitorState::Idle,
            sink,
            coordinator,
            report,
            shutdown: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.retry.consecutive_failures()
    }

    /// Drive probe cycles on the configured interval until shutdown.
    pub async fn run(mut self, shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Database health check disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.config.interval_secs,
            max_retries = self.config.max_retries,
            retry_interval_ms = self.config.retry_interval_ms,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.shutdown = Some(shutdown);

        loop {
            if until_shutdown(&mut self.shutdown, ticker.tick()).await.is_none() {
                self.state = MonitorState::Stopped;
                break;
            }
            if matches!(self.check().await, MonitorState::Terminated | MonitorState::Stopped) {
                break;
            }
        }

        if self.state == MonitorState::Stopped {
            tracing::info!("Health monitor received shutdown signal, exiting loop");
        }
    }

    /// Run one probe cycle, including any retries and escalation.
    ///
    /// Returns `Idle` for a routine healthy probe, `Recovered` when the
    /// database came back after failures, `Terminated` after escalation and
    /// `Stopped` when the shutdown signal arrived first.
    pub async fn check(&mut self) -> MonitorState {
        if matches!(self.state, MonitorState::Terminated | MonitorState::Stopped) {
            return self.state;
        }

        loop {
            self.state = MonitorState::Probing;
            let Some(outcome) = until_shutdown(&mut self.shutdown, self.probe.probe(&self.target)).await
            else {
                return self.stop();
            };
            metrics::record_probe(outcome.label());

            if outcome.is_healthy() {
                return self.on_healthy(&outcome);
            }

            self.sink.record(
                Level::WARN,
                LogTag::Connection,
                &format!("Database unhealthy: {}", outcome.reason().unwrap_or_default()),
            );

            match self.retry.record_failure() {
                FailureAction::Retry { attempt } => {
                    self.state = MonitorState::Retrying;
                    self.publish(&outcome);
                    self.sink.record(
                        Level::INFO,
                        LogTag::Retry,
                        &format!("Retrying in {} seconds...", seconds(self.config.retry_interval())),
                    );
                    tracing::debug!(attempt, max_retries = self.retry.max_retries(), "Scheduling health re-probe");
                    let delay = time::sleep(self.config.retry_interval());
                    if until_shutdown(&mut self.shutdown, delay).await.is_none() {
                        return self.stop();
                    }
                }
                FailureAction::Escalate => {
                    self.state = MonitorState::Escalating;
                    self.publish(&outcome);
                    self.sink.record(
                        Level::ERROR,
                        LogTag::Shutdown,
                        "Service is consistently unhealthy. Restarting...",
                    );
                    self.coordinator.shutdown().await;
                    self.state = MonitorState::Terminated;
                    self.publish(&outcome);
                    return MonitorState::Terminated;
                }
            }
        }
    }

    fn on_healthy(&mut self, outcome: &ProbeOutcome) -> MonitorState {
        let previous_failures = self.retry.record_success();
        let result = if previous_failures > 0 {
            self.sink.record(
                Level::INFO,
                LogTag::Connection,
                "Database reconnected successfully after retry.",
            );
            MonitorState::Recovered
        } else {
            self.sink.record(Level::INFO, LogTag::Info, "Database connection healthy.");
            MonitorState::Idle
        };

        self.state = MonitorState::Idle;
        self.publish(outcome);
        result
    }

    fn stop(&mut self) -> MonitorState {
        tracing::info!(
            consecutive_failures = self.retry.consecutive_failures(),
            "Health check cycle interrupted by shutdown"
        );
        self.state = MonitorState::Stopped;
        MonitorState::Stopped
    }

    fn publish(&self, outcome: &ProbeOutcome) {
        let failures = self.retry.consecutive_failures();
        metrics::record_consecutive_failures(failures);
        self.report
            .publish(HealthSnapshot::from_outcome(outcome, self.state, failures));
    }
}

/// Await `work` unless the shutdown signal fires first. Without a receiver
/// the work always completes.
async fn until_shutdown<T>(
    shutdown: &mut Option<broadcast::Receiver<()>>,
    work: impl Future<Output = T>,
) -> Option<T> {
    match shutdown {
        Some(rx) => tokio::select! {
            biased;
            _ = rx.recv() => None,
            value = work => Some(value),
        },
        None => Some(work.await),
    }
}

/// Whole seconds print without a fraction ("5"), others as milliseconds
/// rounded to three places ("1.5", "0.05").
fn seconds(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    if millis == 0 {
        return secs.to_string();
    }
    let fraction = format!("{millis:03}");
    format!("{secs}.{}", fraction.trim_end_matches('0'))
}
