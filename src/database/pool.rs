//! Pool provider abstraction.
//!
//! # Responsibilities
//! - Describe what the core needs from a pool: a liveness query and a close
//! - Build pools from a [`MysqlConfig`]
//! - Provide the sqlx MySQL implementation used in production

use std::future::Future;
use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::config::MysqlConfig;
use crate::database::error::DbError;

/// Statement used to confirm the database answers.
pub const LIVENESS_QUERY: &str = "SELECT 1";

/// A live connection pool.
pub trait DatabasePool: Send + Sync + 'static {
    /// Run the liveness query once.
    fn ping(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Close every connection; later calls fail.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Builds pools for a configuration.
pub trait PoolFactory: Send + Sync + 'static {
    type Pool: DatabasePool;

    fn create(&self, config: &MysqlConfig) -> Result<Self::Pool, DbError>;
}

impl DatabasePool for MySqlPool {
    fn ping(&self) -> impl Future<Output = Result<(), DbError>> + Send {
        async move {
            sqlx::query(LIVENESS_QUERY)
                .execute(self)
                .await
                .map_err(DbError::Driver)?;
            Ok(())
        }
    }

    fn close(&self) -> impl Future<Output = ()> + Send {
        MySqlPool::close(self)
    }
}

/// Creates lazily-connecting sqlx MySQL pools.
///
/// No connection is opened until the first query, so creation only fails on
/// a configuration that can never work.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlPoolFactory;

impl PoolFactory for MySqlPoolFactory {
    type Pool = MySqlPool;

    fn create(&self, config: &MysqlConfig) -> Result<MySqlPool, DbError> {
        if config.host.trim().is_empty() {
            return Err(DbError::InvalidConfig("host is empty".into()));
        }
        if config.connection_limit == 0 {
            return Err(DbError::InvalidConfig("connection_limit is zero".into()));
        }

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.connection_limit)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            connection_limit = config.connection_limit,
            "MySQL pool created"
        );

        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_host() {
        let config = MysqlConfig {
            host: "  ".into(),
            ..MysqlConfig::default()
        };
        let err = MySqlPoolFactory.create(&config).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_limit() {
        let config = MysqlConfig {
            connection_limit: 0,
            ..MysqlConfig::default()
        };
        assert!(MySqlPoolFactory.create(&config).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_keeps_driver_text() {
        // Nothing listens on port 1; the lazy pool gives up at the acquire deadline.
        let config = MysqlConfig {
            host: "127.0.0.1".into(),
            port: 1,
            acquire_timeout_secs: 1,
            ..MysqlConfig::default()
        };
        let pool = MySqlPoolFactory.create(&config).unwrap();

        let err = pool.ping().await.unwrap_err();
        assert!(matches!(err, DbError::Driver(_)));
        assert_ne!(err.to_string(), "Database has too many connections.");
        pool.close().await;
    }

    #[tokio::test]
    async fn test_creates_lazy_pool_without_server() {
        let pool = MySqlPoolFactory.create(&MysqlConfig::default()).unwrap();
        assert_eq!(pool.size(), 0);
        pool.close().await;
        assert!(pool.is_closed());
    }
}
