//! snippetbox - credential and snippet persistence
//!
//! Two stores share one explicitly constructed connection pool:
//! [`SnippetStore`] for short-lived text snippets and [`UserStore`] for signup, login and
//! password changes. Every operation takes a [`RequestContext`] and returns either a value
//! or a [`ModelError`]; raw driver errors never escape.

mod context;
mod errors;
mod models;
mod snippet;
mod storage;
mod userdb;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

pub use context::RequestContext;
pub use errors::ModelError;
pub use models::{SnippetModel, UserModel};
pub use snippet::{Snippet, SnippetStore};
pub use storage::{
    DataStore, DataStoreConfig, PostgresDataStore, SqliteDataStore, StoreType, UniqueConstraint,
};
pub use userdb::{PasswordHasher, User, UserStore};

pub use mockable::{Clock, DefaultClock};
pub use tokio_util::sync::CancellationToken;

/// Clock shared by the stores; `now` is always taken store-side
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Both stores over one pool
#[derive(Clone)]
pub struct Models {
    pub snippets: SnippetStore,
    pub users: UserStore,
}

impl Models {
    /// Builds both stores on `store` and creates their tables
    pub async fn init(store: Arc<dyn DataStore>) -> Result<Self, ModelError> {
        Self::init_with_hasher(store, PasswordHasher::default()).await
    }

    /// Same as [`Models::init`] with explicit password hashing settings
    pub async fn init_with_hasher(
        store: Arc<dyn DataStore>,
        hasher: PasswordHasher,
    ) -> Result<Self, ModelError> {
        let snippets = SnippetStore::new(store.clone());
        let users = UserStore::new(store).with_hasher(hasher);

        snippets.init().await?;
        users.init().await?;

        Ok(Self { snippets, users })
    }

    /// Reads the data store and password hashing settings from the environment
    pub async fn from_env() -> Result<Self, ModelError> {
        let store = DataStoreConfig::from_env()?.connect().await?;
        Self::init_with_hasher(store, PasswordHasher::from_env()?).await
    }

    pub fn with_clock(self, clock: SharedClock) -> Self {
        Self {
            snippets: self.snippets.with_clock(clock.clone()),
            users: self.users.with_clock(clock),
        }
    }
}
