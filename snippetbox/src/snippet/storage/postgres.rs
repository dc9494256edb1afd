use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::errors::ModelError;
use crate::snippet::types::Snippet;
use crate::storage::validate_postgres_table_schema;

use super::config::DB_TABLE_SNIPPETS;

// PostgreSQL implementations
pub(super) async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            created TIMESTAMPTZ NOT NULL,
            expires TIMESTAMPTZ NOT NULL
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
pub(super) async fn validate_snippet_tables_postgres(pool: &Pool<Postgres>) -> Result<(), ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    let expected_columns = vec![
        ("id", "bigint"),
        ("title", "text"),
        ("content", "text"),
        ("created", "timestamp with time zone"),
        ("expires", "timestamp with time zone"),
    ];

    validate_postgres_table_schema(pool, table_name, &expected_columns, ModelError::Storage).await
}

pub(super) async fn insert_snippet_postgres(
    pool: &Pool<Postgres>,
    title: &str,
    content: &str,
    created: DateTime<Utc>,
    expires: DateTime<Utc>,
) -> Result<i64, ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    sqlx::query_scalar::<_, i64>(&format!(
        r#"
        INSERT INTO {table_name} (title, content, created, expires)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#
    ))
    .bind(title)
    .bind(content)
    .bind(created)
    .bind(expires)
    .fetch_one(pool)
    .await
    .map_err(ModelError::from)
}

pub(super) async fn get_snippet_postgres(
    pool: &Pool<Postgres>,
    id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Snippet>, ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    sqlx::query_as::<_, Snippet>(&format!(
        r#"
        SELECT id, title, content, created, expires FROM {table_name}
        WHERE expires > $1 AND id = $2
        "#
    ))
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(ModelError::from)
}

pub(super) async fn latest_snippets_postgres(
    pool: &Pool<Postgres>,
    now: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<Snippet>, ModelError> {
    let table_name = DB_TABLE_SNIPPETS.as_str();

    sqlx::query_as::<_, Snippet>(&format!(
        r#"
        SELECT id, title, content, created, expires FROM {table_name}
        WHERE expires > $1
        ORDER BY id DESC
        LIMIT $2
        "#
    ))
    .bind(now)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await
    .map_err(ModelError::from)
}
