use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::errors::ModelError;
use crate::snippet::types::Snippet;
use crate::storage::validate_sqlite_table_schema;

use super::config::DB_TABLE_SNIPPETS;

// SQLite implementations
pub(super) async fn create_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            created TIMESTAMP NOT NULL,
            expires TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE INDEX IF NOT EXISTS idx_{table_name}_expires ON {table_name} (expires)
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

/// Validates that the snippets table schema matches what we expect
pub(super) async fn validate_snippet_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    let expected_columns = vec![
        ("id", "INTEGER"),
        ("title", "TEXT"),
        ("content", "TEXT"),
        ("created", "TIMESTAMP"),
        ("expires", "TIMESTAMP"),
    ];

    validate_sqlite_table_schema(pool, table_name, &expected_columns, ModelError::Storage).await
}

pub(super) async fn insert_snippet_sqlite(
    pool: &Pool<Sqlite>,
    title: &str,
    content: &str,
    created: DateTime<Utc>,
    expires: DateTime<Utc>,
) -> Result<i64, ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {table_name} (title, content, created, expires)
        VALUES (?, ?, ?, ?)
        "#
    ))
    .bind(title)
    .bind(content)
    .bind(created)
    .bind(expires)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub(super) async fn get_snippet_sqlite(
    pool: &Pool<Sqlite>,
    id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Snippet>, ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    sqlx::query_as::<_, Snippet>(&format!(
        r#"
        SELECT id, title, content, created, expires FROM {table_name}
        WHERE expires > ? AND id = ?
        "#
    ))
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(ModelError::from)
}

pub(super) async fn latest_snippets_sqlite(
    pool: &Pool<Sqlite>,
    now: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<Snippet>, ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    sqlx::query_as::<_, Snippet>(&format!(
        r#"
        SELECT id, title, content, created, expires FROM {table_name}
        WHERE expires > ?
        ORDER BY id DESC
        LIMIT ?
        "#
    ))
    .bind(now)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await
    .map_err(ModelError::from)
}
