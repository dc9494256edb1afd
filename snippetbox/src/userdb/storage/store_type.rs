use std::sync::Arc;

use mockable::DefaultClock;

use crate::SharedClock;
use crate::context::RequestContext;
use crate::errors::ModelError;
use crate::storage::DataStore;
use crate::userdb::{password::PasswordHasher, types::User};

use super::config::USERS_EMAIL_CONSTRAINT;
use super::postgres::*;
use super::sqlite::*;

/// Signup, login and password changes over the users table.
///
/// Plaintext passwords only ever reach the [`PasswordHasher`]; they are neither stored nor
/// logged.
#[derive(Clone)]
pub struct UserStore {
    store: Arc<dyn DataStore>,
    clock: SharedClock,
    hasher: PasswordHasher,
}

impl UserStore {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            clock: Arc::new(DefaultClock),
            hasher: PasswordHasher::default(),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Initialize the user database tables and the hasher's dummy hash
    pub async fn init(&self) -> Result<(), ModelError> {
        match (self.store.as_sqlite(), self.store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool).await?;
                validate_user_tables_sqlite(pool).await?;
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool).await?;
                validate_user_tables_postgres(pool).await?;
            }
            _ => return Err(ModelError::Storage("Unsupported database type".to_string())),
        }

        self.hasher.warm_up().await
    }

    /// Registers a user and returns the new id.
    ///
    /// Duplicate emails are caught by the table's unique constraint, so two concurrent
    /// signups for the same address cannot both succeed.
    #[tracing::instrument(skip_all)]
    pub async fn insert(
        &self,
        ctx: &RequestContext,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, ModelError> {
        let result = ctx
            .run(async {
                let hashed_password = self.hasher.create_hash(password).await?;
                let created = self.clock.utc();

                let inserted = if let Some(pool) = self.store.as_sqlite() {
                    insert_user_sqlite(pool, name, email, &hashed_password, created).await
                } else if let Some(pool) = self.store.as_postgres() {
                    insert_user_postgres(pool, name, email, &hashed_password, created).await
                } else {
                    return Err(ModelError::Storage("Unsupported database type".to_string()));
                };

                inserted.map_err(|e| {
                    if self.store.is_unique_violation(&e, &USERS_EMAIL_CONSTRAINT) {
                        ModelError::DuplicateEmail
                    } else {
                        ModelError::Storage(e.to_string())
                    }
                })
            })
            .await;

        match &result {
            Ok(id) => tracing::info!(user_id = id, "User registered"),
            Err(ModelError::DuplicateEmail) => tracing::info!("Signup rejected: email in use"),
            Err(e) => tracing::error!(error = %e, "User insert failed"),
        }

        result
    }

    /// Returns the user id for a matching email/password pair.
    ///
    /// An unknown email and a wrong password both yield `InvalidCredentials`.
    #[tracing::instrument(skip_all)]
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<i64, ModelError> {
        let result = ctx
            .run(async {
                let credentials = if let Some(pool) = self.store.as_sqlite() {
                    get_credentials_by_email_sqlite(pool, email).await?
                } else if let Some(pool) = self.store.as_postgres() {
                    get_credentials_by_email_postgres(pool, email).await?
                } else {
                    return Err(ModelError::Storage("Unsupported database type".to_string()));
                };

                let Some((id, hashed_password)) = credentials else {
                    self.hasher.verify_dummy(password).await?;
                    return Err(ModelError::InvalidCredentials);
                };

                if self.hasher.verify(password, &hashed_password).await? {
                    Ok(id)
                } else {
                    Err(ModelError::InvalidCredentials)
                }
            })
            .await;

        match &result {
            Ok(id) => tracing::info!(user_id = id, "User authenticated"),
            Err(ModelError::InvalidCredentials) => tracing::warn!("Authentication failed"),
            Err(e) => tracing::error!(error = %e, "Authentication errored"),
        }

        result
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn exists(&self, ctx: &RequestContext, id: i64) -> Result<bool, ModelError> {
        ctx.run(async {
            if let Some(pool) = self.store.as_sqlite() {
                user_exists_sqlite(pool, id).await
            } else if let Some(pool) = self.store.as_postgres() {
                user_exists_postgres(pool, id).await
            } else {
                Err(ModelError::Storage("Unsupported database type".to_string()))
            }
        })
        .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &RequestContext, id: i64) -> Result<User, ModelError> {
        let result = ctx
            .run(async {
                if let Some(pool) = self.store.as_sqlite() {
                    get_user_sqlite(pool, id).await
                } else if let Some(pool) = self.store.as_postgres() {
                    get_user_postgres(pool, id).await
                } else {
                    Err(ModelError::Storage("Unsupported database type".to_string()))
                }
            })
            .await;

        match result {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                tracing::info!(found = false, "User lookup completed - not found");
                Err(ModelError::NotFound)
            }
            Err(e) => {
                tracing::error!(error = %e, "User lookup failed");
                Err(e)
            }
        }
    }

    /// Replaces the password after re-checking the current one.
    ///
    /// The write only lands if the stored hash is still the one that was just verified, so
    /// a password changed concurrently is never overwritten by a stale check.
    #[tracing::instrument(skip(self, ctx, current_password, new_password))]
    pub async fn password_update(
        &self,
        ctx: &RequestContext,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ModelError> {
        let result = ctx
            .run(async {
                let stored = if let Some(pool) = self.store.as_sqlite() {
                    get_hashed_password_sqlite(pool, id).await?
                } else if let Some(pool) = self.store.as_postgres() {
                    get_hashed_password_postgres(pool, id).await?
                } else {
                    return Err(ModelError::Storage("Unsupported database type".to_string()));
                };

                let Some(stored) = stored else {
                    return Err(ModelError::NotFound);
                };

                if !self.hasher.verify(current_password, &stored).await? {
                    return Err(ModelError::InvalidCredentials);
                }

                let new_hash = self.hasher.create_hash(new_password).await?;

                let updated = if let Some(pool) = self.store.as_sqlite() {
                    update_password_if_unchanged_sqlite(pool, id, &new_hash, &stored).await?
                } else if let Some(pool) = self.store.as_postgres() {
                    update_password_if_unchanged_postgres(pool, id, &new_hash, &stored).await?
                } else {
                    return Err(ModelError::Storage("Unsupported database type".to_string()));
                };

                if updated == 0 {
                    tracing::warn!("Password changed concurrently; update discarded");
                    return Err(ModelError::InvalidCredentials);
                }

                Ok(())
            })
            .await;

        match &result {
            Ok(()) => tracing::info!("Password updated"),
            Err(ModelError::InvalidCredentials) => tracing::warn!("Password update rejected"),
            Err(e) => tracing::error!(error = %e, "Password update failed"),
        }

        result
    }
}
