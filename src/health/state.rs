//! Database health state machine.
//!
//! # States
//! ```text
//! Idle → Probing → Recovered  → Idle
//!                → Retrying   → Probing
//!                → Escalating → Terminated
//! ```
//!
//! A shutdown signal received mid-cycle moves any state to `Stopped`
//! without escalating.
//!
//! # Design Decisions
//! - One counter of consecutive failures, owned by the monitor
//! - Any healthy probe resets the counter, whatever its value
//! - The retry budget is checked before incrementing, so `max_retries`
//!   failures are retried and the next one escalates

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::database::ProbeOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Probing,
    Recovered,
    Retrying,
    Escalating,
    Terminated,
    /// Interrupted by the shutdown signal.
    Stopped,
}

/// What the monitor does after a failed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Sleep and probe again; `attempt` counts from 1.
    Retry { attempt: u32 },
    /// Retry budget exhausted.
    Escalate,
}

/// Consecutive-failure counter with a fixed retry budget.
#[derive(Debug, Clone)]
pub struct RetryState {
    consecutive_failures: u32,
    max_retries: u32,
}

impl RetryState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            consecutive_failures: 0,
            max_retries,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Reset after a healthy probe, returning the count it replaced.
    pub fn record_success(&mut self) -> u32 {
        std::mem::take(&mut self.consecutive_failures)
    }

    /// Decide the next step after an unhealthy probe.
    pub fn record_failure(&mut self) -> FailureAction {
        if self.consecutive_failures < self.max_retries {
            self.consecutive_failures += 1;
            FailureAction::Retry {
                attempt: self.consecutive_failures,
            }
        } else {
            FailureAction::Escalate
        }
    }
}

/// Point-in-time view of database health, served on `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    pub state: MonitorState,
    pub consecutive_failures: u32,
    pub last_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No probe has completed yet.
    Unknown,
    Healthy,
    Unhealthy,
    Terminated,
}

impl HealthSnapshot {
    pub fn initial() -> Self {
        Self {
            status: HealthStatus::Unknown,
            state: MonitorState::Idle,
            consecutive_failures: 0,
            last_reason: None,
        }
    }

    pub fn from_outcome(outcome: &ProbeOutcome, state: MonitorState, consecutive_failures: u32) -> Self {
        let status = match (state, outcome.is_healthy()) {
            (MonitorState::Terminated, _) => HealthStatus::Terminated,
            (_, true) => HealthStatus::Healthy,
            (_, false) => HealthStatus::Unhealthy,
        };
        Self {
            status,
            state,
            consecutive_failures,
            last_reason: outcome.reason().map(str::to_string),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Shared, lock-free handle to the latest [`HealthSnapshot`].
#[derive(Debug, Clone)]
pub struct HealthReport {
    inner: Arc<ArcSwap<HealthSnapshot>>,
}

impl HealthReport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(HealthSnapshot::initial())),
        }
    }

    pub fn publish(&self, snapshot: HealthSnapshot) {
        self.inner.store(Arc::new(snapshot));
    }

    pub fn current(&self) -> Arc<HealthSnapshot> {
        self.inner.load_full()
    }
}

impl Default for HealthReport {
    fn default() -> Self {
        Self::new()
    }
}
