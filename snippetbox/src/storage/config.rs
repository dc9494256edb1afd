//! Data store configuration

use std::{env, str::FromStr, sync::Arc, sync::LazyLock, time::Duration};

use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::types::{DataStore, PostgresDataStore, SqliteDataStore};
use crate::errors::ModelError;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Table prefix from environment variable
pub(crate) static DB_TABLE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("DB_TABLE_PREFIX").unwrap_or_default());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreType {
    Sqlite,
    Postgres,
}

impl FromStr for StoreType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(StoreType::Sqlite),
            "postgres" => Ok(StoreType::Postgres),
            t => Err(ModelError::Storage(format!(
                "Unsupported store type: {t}. Supported types are 'sqlite' and 'postgres'"
            ))),
        }
    }
}

/// Connection settings for the shared pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataStoreConfig {
    pub store_type: StoreType,
    pub url: String,
    pub max_connections: u32,
}

impl DataStoreConfig {
    pub fn new(store_type: StoreType, url: impl Into<String>) -> Self {
        Self {
            store_type,
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Private in-memory SQLite database, mostly for tests and demos
    pub fn sqlite_memory() -> Self {
        Self::new(StoreType::Sqlite, "sqlite::memory:")
    }

    /// Reads `GENERIC_DATA_STORE_TYPE`, `GENERIC_DATA_STORE_URL` and the optional
    /// `GENERIC_DATA_STORE_MAX_CONNECTIONS`
    pub fn from_env() -> Result<Self, ModelError> {
        let store_type = env::var("GENERIC_DATA_STORE_TYPE")
            .map_err(|_| ModelError::Storage("GENERIC_DATA_STORE_TYPE must be set".to_string()))?
            .parse::<StoreType>()?;
        let url = env::var("GENERIC_DATA_STORE_URL")
            .map_err(|_| ModelError::Storage("GENERIC_DATA_STORE_URL must be set".to_string()))?;
        let max_connections = match env::var("GENERIC_DATA_STORE_MAX_CONNECTIONS") {
            Ok(v) => v.parse::<u32>().map_err(|e| {
                ModelError::Storage(format!("Invalid GENERIC_DATA_STORE_MAX_CONNECTIONS: {e}"))
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            store_type,
            url,
            max_connections,
        })
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    fn is_sqlite_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Opens the pool and checks that the database answers.
    pub async fn connect(&self) -> Result<Arc<dyn DataStore>, ModelError> {
        tracing::info!(
            "Initializing data store with type: {:?}, max_connections: {}",
            self.store_type,
            self.max_connections
        );

        let store: Arc<dyn DataStore> = match self.store_type {
            StoreType::Sqlite => {
                let opts = SqliteConnectOptions::from_str(&self.url)?.create_if_missing(true);

                // An in-memory database lives as long as its single connection
                let pool_opts = if self.is_sqlite_memory() {
                    SqlitePoolOptions::new()
                        .max_connections(1)
                        .idle_timeout(None::<Duration>)
                        .max_lifetime(None::<Duration>)
                } else {
                    SqlitePoolOptions::new().max_connections(self.max_connections)
                };

                Arc::new(SqliteDataStore::new(pool_opts.connect_with(opts).await?))
            }
            StoreType::Postgres => Arc::new(PostgresDataStore::new(
                PgPoolOptions::new()
                    .max_connections(self.max_connections)
                    .connect(&self.url)
                    .await?,
            )),
        };

        tracing::info!("Connected to database: type={:?}", self.store_type);

        Ok(store)
    }
}
