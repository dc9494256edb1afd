use std::{env, sync::LazyLock};

use crate::storage::{DB_TABLE_PREFIX, UniqueConstraint};

/// Users table name
pub(crate) static DB_TABLE_USERS: LazyLock<String> = LazyLock::new(|| {
    env::var("DB_TABLE_USERS").unwrap_or_else(|_| format!("{}{}", *DB_TABLE_PREFIX, "users"))
});

/// The constraint that makes signups race-free
pub(super) static USERS_EMAIL_CONSTRAINT: LazyLock<UniqueConstraint> =
    LazyLock::new(|| UniqueConstraint {
        name: format!("{}_uc_email", *DB_TABLE_USERS),
        table: DB_TABLE_USERS.clone(),
        column: "email",
    });
