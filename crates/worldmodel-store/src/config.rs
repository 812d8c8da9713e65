//! Database configuration and connection pool construction.

use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

use crate::error::Result;

/// Connection parameters for the world model database.
///
/// Build one by hand, or pull everything from `WORLD_MODEL_DB_*`
/// environment variables with [`DbConfig::from_env`].
#[derive(Clone)]
pub struct DbConfig {
    /// PostgreSQL host.
    pub host: String,
    /// PostgreSQL port.
    pub port: u16,
    /// Database name. The world model schema lives in `world_model`.
    pub dbname: String,
    /// Database user.
    pub user: String,
    /// Database password.
    pub password: String,
    /// Maximum number of pooled connections.
    pub pool_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "world_model".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            pool_size: 16,
        }
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field(
                "password",
                if self.password.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

impl DbConfig {
    /// Read the configuration from `WORLD_MODEL_DB_HOST`,
    /// `WORLD_MODEL_DB_PORT`, `WORLD_MODEL_DB_NAME`,
    /// `WORLD_MODEL_DB_USER`, `WORLD_MODEL_DB_PASSWORD`, and
    /// `WORLD_MODEL_DB_POOL_SIZE`, falling back to the defaults for any
    /// variable that is unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("WORLD_MODEL_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("WORLD_MODEL_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("WORLD_MODEL_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("WORLD_MODEL_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("WORLD_MODEL_DB_PASSWORD").unwrap_or(defaults.password),
            pool_size: std::env::var("WORLD_MODEL_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pool_size),
        }
    }

    /// Build a connection pool from this configuration.
    ///
    /// The pool hands out connections lazily; use a store's `connect`
    /// constructor to verify that the database is actually reachable.
    pub fn create_pool(&self) -> Result<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(self.pool_size));

        Ok(cfg.create_pool(Some(Runtime::Tokio1), NoTls)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_world_model() {
        let cfg = DbConfig::default();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.dbname, "world_model");
        assert_eq!(cfg.pool_size, 16);
    }

    #[test]
    fn debug_redacts_password() {
        let cfg = DbConfig {
            password: "hunter2".to_string(),
            ..DbConfig::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));

        let empty = DbConfig::default();
        assert!(format!("{empty:?}").contains("<not set>"));
    }

    #[test]
    fn create_pool_succeeds_without_server() {
        // Pool construction is lazy; no server round trip happens here.
        let cfg = DbConfig::default();
        assert!(cfg.create_pool().is_ok());
    }
}
