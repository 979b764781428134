//! Pool fingerprints.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use crate::config::MysqlConfig;

/// Canonical fingerprint of a connection configuration.
///
/// Built from every field of [`MysqlConfig`] as a JSON array, so equal field
/// values always produce equal keys and no two distinct configurations can
/// collide through separator tricks. The raw form contains the password and
/// is never printed; `Display` and `Debug` show a digest instead.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PoolKey(String);

impl PoolKey {
    pub fn from_config(config: &MysqlConfig) -> Self {
        let canonical = Value::Array(vec![
            Value::from(config.host.as_str()),
            Value::from(config.port),
            Value::from(config.user.as_str()),
            Value::from(config.password.as_str()),
            Value::from(config.database.as_str()),
            Value::from(config.connection_limit),
            Value::from(config.acquire_timeout_secs),
        ]);
        Self(canonical.to_string())
    }

    /// Short digest, stable for the lifetime of the process.
    pub fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish()
    }
}

impl From<&MysqlConfig> for PoolKey {
    fn from(config: &MysqlConfig) -> Self {
        Self::from_config(config)
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool-{:016x}", self.digest())
    }
}

impl fmt::Debug for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PoolKey").field(&format_args!("{:016x}", self.digest())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MysqlConfig {
        MysqlConfig {
            host: "db.internal".into(),
            port: 3306,
            user: "svc".into(),
            password: "hunter2".into(),
            database: "accounts".into(),
            connection_limit: 10,
            acquire_timeout_secs: 5,
        }
    }

    #[test]
    fn test_independent_configs_share_key() {
        let a = config();
        let b = config();
        assert_eq!(PoolKey::from(&a), PoolKey::from(&b));
        assert_eq!(PoolKey::from(&a).digest(), PoolKey::from(&b).digest());
    }

    #[test]
    fn test_every_field_distinguishes() {
        let base = PoolKey::from(&config());

        let mut c = config();
        c.connection_limit = 11;
        assert_ne!(base, PoolKey::from(&c));

        let mut c = config();
        c.password = "other".into();
        assert_ne!(base, PoolKey::from(&c));

        let mut c = config();
        c.database = "drivers".into();
        assert_ne!(base, PoolKey::from(&c));
    }

    #[test]
    fn test_field_boundaries_do_not_collide() {
        let mut a = config();
        a.user = "svc:x".into();
        a.password = "y".into();
        let mut b = config();
        b.user = "svc".into();
        b.password = "x:y".into();
        assert_ne!(PoolKey::from(&a), PoolKey::from(&b));
    }

    #[test]
    fn test_display_hides_password() {
        let key = PoolKey::from(&config());
        assert!(!key.to_string().contains("hunter2"));
        assert!(!format!("{key:?}").contains("hunter2"));
    }
}
