use std::sync::Arc;

use mockable::DefaultClock;

use crate::SharedClock;
use crate::context::RequestContext;
use crate::errors::ModelError;
use crate::snippet::types::{Snippet, expiry_from};
use crate::storage::DataStore;

use super::config::SNIPPET_LATEST_LIMIT;
use super::postgres::*;
use super::sqlite::*;

/// Creates, reads and lists snippets, hiding expired ones from every read.
///
/// `now` always comes from the store's clock, never from the caller.
#[derive(Clone)]
pub struct SnippetStore {
    store: Arc<dyn DataStore>,
    clock: SharedClock,
    latest_limit: u32,
}

impl SnippetStore {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            clock: Arc::new(DefaultClock),
            latest_limit: *SNIPPET_LATEST_LIMIT,
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_latest_limit(mut self, limit: u32) -> Self {
        self.latest_limit = limit;
        self
    }

    /// Initialize the snippets table
    pub async fn init(&self) -> Result<(), ModelError> {
        match (self.store.as_sqlite(), self.store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool).await?;
                validate_snippet_tables_sqlite(pool).await?;
                Ok(())
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool).await?;
                validate_snippet_tables_postgres(pool).await?;
                Ok(())
            }
            _ => Err(ModelError::Storage("Unsupported database type".to_string())),
        }
    }

    /// Stores a new snippet expiring `expires_in_days` after now and returns its id
    #[tracing::instrument(skip(self, ctx, title, content))]
    pub async fn insert(
        &self,
        ctx: &RequestContext,
        title: &str,
        content: &str,
        expires_in_days: u32,
    ) -> Result<i64, ModelError> {
        let created = self.clock.utc();
        let expires = expiry_from(created, expires_in_days)
            .inspect_err(|e| tracing::error!(error = %e, "Snippet insert rejected"))?;

        let result = ctx
            .run(async {
                if let Some(pool) = self.store.as_sqlite() {
                    insert_snippet_sqlite(pool, title, content, created, expires).await
                } else if let Some(pool) = self.store.as_postgres() {
                    insert_snippet_postgres(pool, title, content, created, expires).await
                } else {
                    Err(ModelError::Storage("Unsupported database type".to_string()))
                }
            })
            .await
            // RowNotFound on insert is a storage fault, not a missing snippet
            .map_err(|e| match e {
                ModelError::NotFound => ModelError::Storage("Insert returned no id".to_string()),
                other => other,
            });

        match &result {
            Ok(id) => tracing::info!(snippet_id = id, %expires, "Snippet created"),
            Err(e) => tracing::error!(error = %e, "Snippet insert failed"),
        }

        result
    }

    /// Returns the snippet if it exists and has not expired
    #[tracing::instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &RequestContext, id: i64) -> Result<Snippet, ModelError> {
        let now = self.clock.utc();

        let result = ctx
            .run(async {
                if let Some(pool) = self.store.as_sqlite() {
                    get_snippet_sqlite(pool, id, now).await
                } else if let Some(pool) = self.store.as_postgres() {
                    get_snippet_postgres(pool, id, now).await
                } else {
                    Err(ModelError::Storage("Unsupported database type".to_string()))
                }
            })
            .await;

        match result {
            Ok(Some(snippet)) => Ok(snippet),
            // Expired and never-existing ids are reported the same way
            Ok(None) => {
                tracing::debug!("Snippet not found or expired");
                Err(ModelError::NotFound)
            }
            Err(e) => {
                tracing::error!(error = %e, "Snippet lookup failed");
                Err(e)
            }
        }
    }

    /// Most recent visible snippets, newest first, capped at the configured limit
    pub async fn latest(&self, ctx: &RequestContext) -> Result<Vec<Snippet>, ModelError> {
        self.latest_with_limit(ctx, self.latest_limit).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn latest_with_limit(
        &self,
        ctx: &RequestContext,
        limit: u32,
    ) -> Result<Vec<Snippet>, ModelError> {
        let now = self.clock.utc();

        let result = ctx
            .run(async {
                if let Some(pool) = self.store.as_sqlite() {
                    latest_snippets_sqlite(pool, now, limit).await
                } else if let Some(pool) = self.store.as_postgres() {
                    latest_snippets_postgres(pool, now, limit).await
                } else {
                    Err(ModelError::Storage("Unsupported database type".to_string()))
                }
            })
            .await;

        match &result {
            Ok(snippets) => tracing::debug!(count = snippets.len(), "Latest snippets listed"),
            Err(e) => tracing::error!(error = %e, "Listing latest snippets failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MutableClock, sqlite_store};
    use chrono::{Duration, TimeZone, Utc};

    async fn store_with_clock() -> (SnippetStore, Arc<MutableClock>) {
        let clock = Arc::new(MutableClock::starting_at_fixture());
        let store = SnippetStore::new(sqlite_store().await).with_clock(clock.clone());
        store.init().await.expect("Failed to initialize SnippetStore");
        (store, clock)
    }

    /// init creates the table and can run again on an existing schema
    #[tokio::test]
    async fn test_snippetstore_init_is_idempotent() {
        let (store, _clock) = store_with_clock().await;
        assert!(store.init().await.is_ok());
    }

    /// Insert then get returns the inputs and an expiry exactly N days out
    #[tokio::test]
    async fn test_insert_then_get_roundtrip() {
        let (store, _clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        let id = store.insert(&ctx, "Title", "Some content", 7).await.unwrap();
        assert!(id > 0, "ids are positive");

        let snippet = store.get(&ctx, id).await.unwrap();
        assert_eq!(snippet.id, id);
        assert_eq!(snippet.title, "Title");
        assert_eq!(snippet.content, "Some content");
        assert_eq!(snippet.expires - snippet.created, Duration::days(7));
    }

    /// Created is assigned by the store's clock
    #[tokio::test]
    async fn test_created_comes_from_store_clock() {
        let (store, clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        let id = store.insert(&ctx, "Title", "Body", 1).await.unwrap();
        let snippet = store.get(&ctx, id).await.unwrap();

        assert_eq!(snippet.created, clock.now());
    }

    /// The concrete one-day scenario: visible now, gone after a day
    #[tokio::test]
    async fn test_snippet_expires_after_one_day() {
        let (store, clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        let id = store.insert(&ctx, "Test", "Body", 1).await.unwrap();
        assert!(store.get(&ctx, id).await.is_ok());

        clock.advance(Duration::hours(23));
        assert!(store.get(&ctx, id).await.is_ok());

        clock.advance(Duration::hours(1) + Duration::seconds(1));
        assert_eq!(store.get(&ctx, id).await, Err(ModelError::NotFound));
    }

    /// Expiry is exclusive at the boundary instant
    #[tokio::test]
    async fn test_snippet_not_visible_at_exact_expiry() {
        let (store, clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        let id = store.insert(&ctx, "Test", "Body", 1).await.unwrap();
        clock.advance(Duration::days(1));

        assert_eq!(store.get(&ctx, id).await, Err(ModelError::NotFound));
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let (store, _clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        assert_eq!(store.get(&ctx, 9999).await, Err(ModelError::NotFound));
    }

    #[tokio::test]
    async fn test_latest_empty_store() {
        let (store, _clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        let snippets = store.latest(&ctx).await.unwrap();
        assert!(snippets.is_empty());
    }

    /// Latest is capped, ordered by descending id, and skips expired rows
    #[tokio::test]
    async fn test_latest_limit_order_and_expiry() {
        let (store, clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        // Twelve long-lived snippets, then three that expire after one day
        let mut long_lived = Vec::new();
        for i in 0..12 {
            long_lived.push(
                store
                    .insert(&ctx, &format!("keep {i}"), "Body", 365)
                    .await
                    .unwrap(),
            );
        }
        for i in 0..3 {
            store
                .insert(&ctx, &format!("short {i}"), "Body", 1)
                .await
                .unwrap();
        }

        let before = store.latest(&ctx).await.unwrap();
        assert_eq!(before.len(), 10);
        assert!(before.windows(2).all(|w| w[0].id > w[1].id));
        assert!(before.iter().take(3).all(|s| s.title.starts_with("short")));

        clock.advance(Duration::days(2));

        let after = store.latest(&ctx).await.unwrap();
        let expected: Vec<i64> = long_lived.iter().rev().take(10).copied().collect();
        assert_eq!(after.iter().map(|s| s.id).collect::<Vec<_>>(), expected);
        assert!(after.iter().all(|s| s.is_visible_at(clock.now())));
    }

    #[tokio::test]
    async fn test_latest_with_explicit_and_configured_limit() {
        let (store, _clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        for i in 0..5 {
            store
                .insert(&ctx, &format!("s{i}"), "Body", 1)
                .await
                .unwrap();
        }

        assert_eq!(store.latest_with_limit(&ctx, 2).await.unwrap().len(), 2);
        assert_eq!(store.latest_with_limit(&ctx, 0).await.unwrap().len(), 0);

        let capped = store.clone().with_latest_limit(3);
        assert_eq!(capped.latest(&ctx).await.unwrap().len(), 3);
    }

    /// Zero-day snippets are stored but never visible
    #[tokio::test]
    async fn test_zero_day_snippet_is_immediately_expired() {
        let (store, _clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        let id = store.insert(&ctx, "Gone", "Body", 0).await.unwrap();

        assert_eq!(store.get(&ctx, id).await, Err(ModelError::NotFound));
        assert!(store.latest(&ctx).await.unwrap().is_empty());
    }

    /// A day count past the representable range is an error, not a panic
    #[tokio::test]
    async fn test_insert_rejects_out_of_range_expiry() {
        let (store, _clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        for days in [u32::MAX, 3_000_000] {
            let result = store.insert(&ctx, "Forever", "Body", days).await;
            assert!(matches!(result, Err(ModelError::Storage(_))), "{days} days");
        }

        assert!(store.latest(&ctx).await.unwrap().is_empty());
    }

    /// The furthest accepted expiry still compares as later than now
    #[tokio::test]
    async fn test_far_future_snippet_stays_visible() {
        let (store, clock) = store_with_clock().await;
        let ctx = RequestContext::new();

        let last_day = Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).unwrap();
        let days = u32::try_from((last_day - clock.now()).num_days()).unwrap();

        let id = store.insert(&ctx, "Long", "Body", days).await.unwrap();

        let snippet = store.get(&ctx, id).await.unwrap();
        assert_eq!(snippet.expires, last_day);
        assert_eq!(store.latest(&ctx).await.unwrap()[0].id, id);
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts_operations() {
        let (store, _clock) = store_with_clock().await;
        let ctx = RequestContext::new();
        let id = store.insert(&ctx, "Test", "Body", 1).await.unwrap();

        let cancelled = RequestContext::new();
        cancelled.cancel();

        assert_eq!(
            store.insert(&cancelled, "Test", "Body", 1).await,
            Err(ModelError::Cancelled)
        );
        assert_eq!(store.get(&cancelled, id).await, Err(ModelError::Cancelled));
        assert_eq!(store.latest(&cancelled).await, Err(ModelError::Cancelled));

        // Nothing was written by the cancelled insert
        assert_eq!(store.latest(&ctx).await.unwrap().len(), 1);
    }
}
