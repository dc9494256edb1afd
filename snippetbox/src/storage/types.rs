use sqlx::{Pool, Postgres, Sqlite};

/// A uniqueness constraint the stores rely on for race-free duplicate detection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniqueConstraint {
    /// Constraint name as declared in the table definition
    pub name: String,
    pub table: String,
    pub column: &'static str,
}

// Types
#[derive(Clone, Debug)]
pub struct SqliteDataStore {
    pub(super) pool: sqlx::SqlitePool,
}

#[derive(Clone, Debug)]
pub struct PostgresDataStore {
    pub(super) pool: sqlx::PgPool,
}

/// Handle to the shared connection pool.
///
/// Each engine also decides how its driver reports a uniqueness violation, so the stores
/// never look at engine-specific error codes themselves.
pub trait DataStore: Send + Sync + std::fmt::Debug {
    fn as_sqlite(&self) -> Option<&Pool<Sqlite>>;
    fn as_postgres(&self) -> Option<&Pool<Postgres>>;

    /// Whether `err` is a violation of `constraint`
    fn is_unique_violation(&self, err: &sqlx::Error, constraint: &UniqueConstraint) -> bool;
}

// Store implementations
impl DataStore for SqliteDataStore {
    fn as_sqlite(&self) -> Option<&Pool<Sqlite>> {
        Some(&self.pool)
    }

    fn as_postgres(&self) -> Option<&Pool<Postgres>> {
        None
    }

    // SQLite reports extended code 2067 with "UNIQUE constraint failed: <table>.<column>"
    // and never carries the constraint name.
    fn is_unique_violation(&self, err: &sqlx::Error, constraint: &UniqueConstraint) -> bool {
        match err {
            sqlx::Error::Database(db_err) => {
                db_err.is_unique_violation()
                    && db_err
                        .message()
                        .contains(&format!("{}.{}", constraint.table, constraint.column))
            }
            _ => false,
        }
    }
}

impl DataStore for PostgresDataStore {
    fn as_sqlite(&self) -> Option<&Pool<Sqlite>> {
        None
    }

    fn as_postgres(&self) -> Option<&Pool<Postgres>> {
        Some(&self.pool)
    }

    // SQLSTATE 23505 plus the declared constraint name
    fn is_unique_violation(&self, err: &sqlx::Error, constraint: &UniqueConstraint) -> bool {
        match err {
            sqlx::Error::Database(db_err) => {
                db_err.is_unique_violation() && db_err.constraint() == Some(constraint.name.as_str())
            }
            _ => false,
        }
    }
}

impl SqliteDataStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

impl PostgresDataStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}
