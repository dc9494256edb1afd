use std::{env, sync::LazyLock};

use crate::storage::DB_TABLE_PREFIX;

/// Snippets table name
pub(crate) static DB_TABLE_SNIPPETS: LazyLock<String> = LazyLock::new(|| {
    env::var("DB_TABLE_SNIPPETS").unwrap_or_else(|_| format!("{}{}", *DB_TABLE_PREFIX, "snippets"))
});

/// How many snippets `latest` returns unless told otherwise
pub(crate) static SNIPPET_LATEST_LIMIT: LazyLock<u32> = LazyLock::new(|| {
    env::var("SNIPPET_LATEST_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10)
});
