//! Trait seams over the stores, so request handlers can be tested against fakes

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::errors::ModelError;
use crate::snippet::{Snippet, SnippetStore};
use crate::userdb::{User, UserStore};

#[async_trait]
pub trait SnippetModel: Send + Sync {
    async fn insert(
        &self,
        ctx: &RequestContext,
        title: &str,
        content: &str,
        expires_in_days: u32,
    ) -> Result<i64, ModelError>;

    async fn get(&self, ctx: &RequestContext, id: i64) -> Result<Snippet, ModelError>;

    async fn latest(&self, ctx: &RequestContext) -> Result<Vec<Snippet>, ModelError>;
}

#[async_trait]
pub trait UserModel: Send + Sync {
    async fn insert(
        &self,
        ctx: &RequestContext,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, ModelError>;

    async fn authenticate(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<i64, ModelError>;

    async fn exists(&self, ctx: &RequestContext, id: i64) -> Result<bool, ModelError>;

    async fn get(&self, ctx: &RequestContext, id: i64) -> Result<User, ModelError>;

    async fn password_update(
        &self,
        ctx: &RequestContext,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ModelError>;
}

#[async_trait]
impl SnippetModel for SnippetStore {
    async fn insert(
        &self,
        ctx: &RequestContext,
        title: &str,
        content: &str,
        expires_in_days: u32,
    ) -> Result<i64, ModelError> {
        SnippetStore::insert(self, ctx, title, content, expires_in_days).await
    }

    async fn get(&self, ctx: &RequestContext, id: i64) -> Result<Snippet, ModelError> {
        SnippetStore::get(self, ctx, id).await
    }

    async fn latest(&self, ctx: &RequestContext) -> Result<Vec<Snippet>, ModelError> {
        SnippetStore::latest(self, ctx).await
    }
}

#[async_trait]
impl UserModel for UserStore {
    async fn insert(
        &self,
        ctx: &RequestContext,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, ModelError> {
        UserStore::insert(self, ctx, name, email, password).await
    }

    async fn authenticate(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<i64, ModelError> {
        UserStore::authenticate(self, ctx, email, password).await
    }

    async fn exists(&self, ctx: &RequestContext, id: i64) -> Result<bool, ModelError> {
        UserStore::exists(self, ctx, id).await
    }

    async fn get(&self, ctx: &RequestContext, id: i64) -> Result<User, ModelError> {
        UserStore::get(self, ctx, id).await
    }

    async fn password_update(
        &self,
        ctx: &RequestContext,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ModelError> {
        UserStore::password_update(self, ctx, id, current_password, new_password).await
    }
}
