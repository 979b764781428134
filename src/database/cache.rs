//! Keyed pool cache.
//!
//! # Responsibilities
//! - Map configuration fingerprints to exactly one live pool
//! - Create pools on first use, reuse them afterwards
//! - Close every pool on shutdown
//!
//! # Design Decisions
//! - No eviction: the service talks to a small fixed set of databases
//! - Creation runs while holding the DashMap shard lock for the key, so
//!   concurrent first callers construct one pool and all receive it
//! - Locking is per shard, not per key: a creation also blocks other keys
//!   that hash to the same shard until the factory returns. Factories must
//!   stay cheap (the sqlx pool connects lazily) and must not touch the cache

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::MysqlConfig;
use crate::database::error::DbError;
use crate::database::key::PoolKey;
use crate::database::pool::{DatabasePool, PoolFactory};
use crate::observability::metrics;

/// Process-wide cache of connection pools.
pub struct PoolCache<F: PoolFactory> {
    factory: F,
    entries: DashMap<PoolKey, Arc<F::Pool>>,
}

impl<F: PoolFactory> PoolCache<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            entries: DashMap::new(),
        }
    }

    /// Return the cached pool for `config`, if one exists.
    pub fn lookup(&self, config: &MysqlConfig) -> Option<Arc<F::Pool>> {
        self.get(&PoolKey::from_config(config))
    }

    /// Return the pool for `config`, creating it if absent.
    pub fn get_or_create(&self, config: &MysqlConfig) -> Result<Arc<F::Pool>, DbError> {
        let key = PoolKey::from_config(config);

        let cached = self.get(&key);
        if let Some(pool) = cached {
            return Ok(pool);
        }

        // Re-checked under the shard lock: a racing caller may have won.
        let entry = self.entries.entry(key.clone()).or_try_insert_with(|| {
            tracing::debug!(key = %key, "Creating connection pool");
            self.factory.create(config).map(Arc::new)
        })?;
        let pool = entry.value().clone();
        drop(entry);

        metrics::record_pools_cached(self.entries.len());
        Ok(pool)
    }

    /// Number of cached pools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close every cached pool. Entries stay in place; a closed pool fails
    /// further queries instead of being silently replaced.
    pub async fn close_all(&self) {
        let pools: Vec<(PoolKey, Arc<F::Pool>)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (key, pool) in pools {
            pool.close().await;
            tracing::info!(key = %key, "Connection pool closed");
        }
    }

    fn get(&self, key: &PoolKey) -> Option<Arc<F::Pool>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }
}
