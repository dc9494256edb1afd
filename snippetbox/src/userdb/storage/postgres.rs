use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::errors::ModelError;
use crate::storage::validate_postgres_table_schema;
use crate::userdb::types::User;

use super::config::{DB_TABLE_USERS, USERS_EMAIL_CONSTRAINT};

// PostgreSQL implementations
pub(super) async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), ModelError> {
    let table_name = DB_TABLE_USERS.as_str();
    let constraint = USERS_EMAIL_CONSTRAINT.name.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            hashed_password BYTEA NOT NULL,
            created TIMESTAMPTZ NOT NULL,
            CONSTRAINT {constraint} UNIQUE (email)
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

/// Validates that the users table schema matches what we expect
pub(super) async fn validate_user_tables_postgres(pool: &Pool<Postgres>) -> Result<(), ModelError> {
    let users_table = DB_TABLE_USERS.as_str();

    let expected_columns = vec![
        ("id", "bigint"),
        ("name", "text"),
        ("email", "text"),
        ("hashed_password", "bytea"),
        ("created", "timestamp with time zone"),
    ];

    validate_postgres_table_schema(pool, users_table, &expected_columns, ModelError::Storage)
        .await
}

/// Raw driver error is returned so the caller can classify uniqueness violations
pub(super) async fn insert_user_postgres(
    pool: &Pool<Postgres>,
    name: &str,
    email: &str,
    hashed_password: &[u8],
    created: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let table_name = DB_TABLE_USERS.as_str();

    sqlx::query_scalar::<_, i64>(&format!(
        r#"
        INSERT INTO {table_name} (name, email, hashed_password, created)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#
    ))
    .bind(name)
    .bind(email)
    .bind(hashed_password)
    .bind(created)
    .fetch_one(pool)
    .await
}

pub(super) async fn get_credentials_by_email_postgres(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<(i64, Vec<u8>)>, ModelError> {
    let table_name = DB_TABLE_USERS.as_str();

    sqlx::query_as::<_, (i64, Vec<u8>)>(&format!(
        r#"
        SELECT id, hashed_password FROM {table_name} WHERE email = $1
        "#
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(ModelError::from)
}

pub(super) async fn get_hashed_password_postgres(
    pool: &Pool<Postgres>,
    id: i64,
) -> Result<Option<Vec<u8>>, ModelError> {
    let table_name = DB_TABLE_USERS.as_str();

    sqlx::query_scalar::<_, Vec<u8>>(&format!(
        r#"
        SELECT hashed_password FROM {table_name} WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(ModelError::from)
}

pub(super) async fn user_exists_postgres(
    pool: &Pool<Postgres>,
    id: i64,
) -> Result<bool, ModelError> {
    let table_name = DB_TABLE_USERS.as_str();

    sqlx::query_scalar::<_, bool>(&format!(
        r#"
        SELECT EXISTS(SELECT 1 FROM {table_name} WHERE id = $1)
        "#
    ))
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(ModelError::from)
}

pub(super) async fn get_user_postgres(
    pool: &Pool<Postgres>,
    id: i64,
) -> Result<Option<User>, ModelError> {
    let table_name = DB_TABLE_USERS.as_str();

    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT id, name, email, hashed_password, created FROM {table_name} WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(ModelError::from)
}

/// Writes `new_hash` only if the stored hash is still `expected_hash`; returns rows changed
pub(super) async fn update_password_if_unchanged_postgres(
    pool: &Pool<Postgres>,
    id: i64,
    new_hash: &[u8],
    expected_hash: &[u8],
) -> Result<u64, ModelError> {
    let table_name = DB_TABLE_USERS.as_str();

    let result = sqlx::query(&format!(
        r#"
        UPDATE {table_name} SET hashed_password = $1
        WHERE id = $2 AND hashed_password = $3
        "#
    ))
    .bind(new_hash)
    .bind(id)
    .bind(expected_hash)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
