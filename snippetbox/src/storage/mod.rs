mod config;
mod schema_validation;
mod types;

pub use config::{DataStoreConfig, StoreType};
pub(crate) use config::DB_TABLE_PREFIX;
pub use types::{DataStore, PostgresDataStore, SqliteDataStore, UniqueConstraint};

pub(crate) use schema_validation::{validate_postgres_table_schema, validate_sqlite_table_schema};
