//! Database liveness probing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::config::MysqlConfig;
use crate::database::cache::PoolCache;
use crate::database::pool::{DatabasePool, PoolFactory};

/// Reason reported when no pool could be resolved for a configuration.
pub const NO_POOL_REASON: &str = "No connection pool found";

/// Result of a single liveness probe. Produced fresh on every probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    Unhealthy(String),
    NoPool,
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy)
    }

    /// Operator-facing reason for a failed probe.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ProbeOutcome::Healthy => None,
            ProbeOutcome::Unhealthy(reason) => Some(reason.as_str()),
            ProbeOutcome::NoPool => Some(NO_POOL_REASON),
        }
    }

    /// Stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Healthy => "healthy",
            ProbeOutcome::Unhealthy(_) => "unhealthy",
            ProbeOutcome::NoPool => "no_pool",
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}: {}", self.label(), reason),
            None => f.write_str(self.label()),
        }
    }
}

/// Runs liveness queries against pools resolved from the shared cache.
pub struct ProbeRunner<F: PoolFactory> {
    pools: Arc<PoolCache<F>>,
    timeout: Duration,
}

impl<F: PoolFactory> ProbeRunner<F> {
    pub fn new(pools: Arc<PoolCache<F>>, timeout: Duration) -> Self {
        Self { pools, timeout }
    }

    /// Probe the database behind `config`. Never fails; every error is
    /// folded into the returned outcome.
    pub async fn probe(&self, config: &MysqlConfig) -> ProbeOutcome {
        let pool = match self.pools.lookup(config) {
            Some(pool) => pool,
            None => match self.pools.get_or_create(config) {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not create connection pool for probe");
                    return ProbeOutcome::NoPool;
                }
            },
        };

        match time::timeout(self.timeout, pool.ping()).await {
            Ok(Ok(())) => ProbeOutcome::Healthy,
            Ok(Err(e)) => ProbeOutcome::Unhealthy(e.to_string()),
            Err(_) => ProbeOutcome::Unhealthy(format!(
                "Liveness query timed out after {}ms",
                self.timeout.as_millis()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::error::DbError;
    use std::future::Future;

    enum Behavior {
        Up,
        Fail(&'static str),
        AcquireTimeout,
        Hang,
    }

    struct ScriptedPool(Behavior);

    impl DatabasePool for ScriptedPool {
        fn ping(&self) -> impl Future<Output = Result<(), DbError>> + Send {
            async move {
                match &self.0 {
                    Behavior::Up => Ok(()),
                    Behavior::Fail(msg) => Err(DbError::Connection(msg.to_string())),
                    Behavior::AcquireTimeout => Err(DbError::Driver(sqlx::Error::PoolTimedOut)),
                    Behavior::Hang => {
                        std::future::pending::<()>().await;
                        Ok(())
                    }
                }
            }
        }

        fn close(&self) -> impl Future<Output = ()> + Send {
            async {}
        }
    }

    struct ScriptedFactory;

    impl PoolFactory for ScriptedFactory {
        type Pool = ScriptedPool;

        fn create(&self, config: &MysqlConfig) -> Result<ScriptedPool, DbError> {
            match config.database.as_str() {
                "ok" => Ok(ScriptedPool(Behavior::Up)),
                "down" => Ok(ScriptedPool(Behavior::Fail("Connection lost"))),
                "hang" => Ok(ScriptedPool(Behavior::Hang)),
                "unreachable" => Ok(ScriptedPool(Behavior::AcquireTimeout)),
                _ => Err(DbError::InvalidConfig("unknown database".into())),
            }
        }
    }

    fn runner() -> ProbeRunner<ScriptedFactory> {
        ProbeRunner::new(
            Arc::new(PoolCache::new(ScriptedFactory)),
            Duration::from_millis(3000),
        )
    }

    fn target(database: &str) -> MysqlConfig {
        MysqlConfig {
            database: database.into(),
            ..MysqlConfig::default()
        }
    }

    #[tokio::test]
    async fn test_healthy_probe_populates_cache() {
        let runner = runner();
        assert!(runner.pools.lookup(&target("ok")).is_none());

        assert_eq!(runner.probe(&target("ok")).await, ProbeOutcome::Healthy);
        assert!(runner.pools.lookup(&target("ok")).is_some());

        assert_eq!(runner.probe(&target("ok")).await, ProbeOutcome::Healthy);
        assert_eq!(runner.pools.len(), 1);
    }

    #[tokio::test]
    async fn test_query_error_keeps_reason() {
        let outcome = runner().probe(&target("down")).await;
        assert_eq!(outcome, ProbeOutcome::Unhealthy("Connection lost".into()));
        assert_eq!(outcome.reason(), Some("Connection lost"));
    }

    #[tokio::test]
    async fn test_driver_error_reason_is_driver_text() {
        let outcome = runner().probe(&target("unreachable")).await;
        assert_eq!(
            outcome.reason(),
            Some(sqlx::Error::PoolTimedOut.to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_creation_failure_is_no_pool() {
        let outcome = runner().probe(&target("missing")).await;
        assert_eq!(outcome, ProbeOutcome::NoPool);
        assert_eq!(outcome.reason(), Some(NO_POOL_REASON));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_query_times_out() {
        let outcome = runner().probe(&target("hang")).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Unhealthy("Liveness query timed out after 3000ms".into())
        );
    }
}
