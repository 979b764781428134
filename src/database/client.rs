//! Query client shared by the repositories.
//!
//! Resolves its pool through the same [`PoolCache`] the health monitor
//! probes, so a configuration only ever has one pool behind it.

use std::sync::Arc;

use sqlx::mysql::{MySql, MySqlArguments, MySqlPool, MySqlRow};
use sqlx::query::Query;

use crate::config::MysqlConfig;
use crate::database::cache::PoolCache;
use crate::database::error::DbError;
use crate::database::pool::MySqlPoolFactory;

/// Positional parameter for a prepared statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        SqlParam::Bool(value)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlParam::Null, Into::into)
    }
}

/// Handle for running statements against one configured database.
#[derive(Clone)]
pub struct Database {
    config: MysqlConfig,
    pools: Arc<PoolCache<MySqlPoolFactory>>,
}

impl Database {
    pub fn new(config: MysqlConfig, pools: Arc<PoolCache<MySqlPoolFactory>>) -> Self {
        Self { config, pools }
    }

    pub fn config(&self) -> &MysqlConfig {
        &self.config
    }

    /// Run a statement without parameters.
    pub async fn query(&self, statement: &str) -> Result<Vec<MySqlRow>, DbError> {
        let pool = self.pool()?;
        let rows = sqlx::query(statement)
            .fetch_all(&*pool)
            .await
            .map_err(DbError::from_driver)?;
        Ok(rows)
    }

    /// Run a statement, binding `params` to its `?` placeholders in order.
    pub async fn prepared_query<'q>(
        &self,
        statement: &'q str,
        params: &'q [SqlParam],
    ) -> Result<Vec<MySqlRow>, DbError> {
        let pool = self.pool()?;
        let rows = bind_params(sqlx::query(statement), params)
            .fetch_all(&*pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Prepared query failed");
                DbError::from_driver(e)
            })?;
        Ok(rows)
    }

    fn pool(&self) -> Result<Arc<MySqlPool>, DbError> {
        self.pools.get_or_create(&self.config)
    }
}

fn bind_params<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &'q [SqlParam],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Bool(value) => query.bind(*value),
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::Text(value) => query.bind(value.as_str()),
        };
    }
    query
}
