use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::AuthorResult;
use super::model::AuthorRecord;
use super::repo;

/// Persistence seam for authors. Lookups that find nothing return
/// `AuthorError::NotFound`.
#[async_trait]
pub trait AuthorStore: Send + Sync {
    async fn insert(&self, author: &AuthorRecord) -> AuthorResult<()>;
    async fn update(&self, author: &AuthorRecord) -> AuthorResult<()>;
    async fn delete(&self, author_id: Uuid) -> AuthorResult<()>;
    async fn get_by_id(&self, author_id: Uuid) -> AuthorResult<AuthorRecord>;
    async fn get_by_email(&self, email: &str) -> AuthorResult<AuthorRecord>;
    async fn get_by_username(&self, username: &str) -> AuthorResult<AuthorRecord>;
    async fn get_by_activation_token(&self, token: &str) -> AuthorResult<AuthorRecord>;
    async fn search_by_username(&self, fragment: &str) -> AuthorResult<Vec<AuthorRecord>>;
    async fn get_all(&self) -> AuthorResult<Vec<AuthorRecord>>;
}

pub type AuthorStoreArc = Arc<dyn AuthorStore>;

#[derive(Clone)]
pub struct PgAuthorStore {
    db: PgPool,
}

impl PgAuthorStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorStore for PgAuthorStore {
    async fn insert(&self, author: &AuthorRecord) -> AuthorResult<()> {
        repo::insert(&self.db, author).await
    }

    async fn update(&self, author: &AuthorRecord) -> AuthorResult<()> {
        repo::update(&self.db, author).await
    }

    async fn delete(&self, author_id: Uuid) -> AuthorResult<()> {
        repo::delete(&self.db, author_id).await
    }

    async fn get_by_id(&self, author_id: Uuid) -> AuthorResult<AuthorRecord> {
        repo::get_by_id(&self.db, author_id).await
    }

    async fn get_by_email(&self, email: &str) -> AuthorResult<AuthorRecord> {
        repo::get_by_email(&self.db, email).await
    }

    async fn get_by_username(&self, username: &str) -> AuthorResult<AuthorRecord> {
        repo::get_by_username(&self.db, username).await
    }

    async fn get_by_activation_token(&self, token: &str) -> AuthorResult<AuthorRecord> {
        repo::get_by_activation_token(&self.db, token).await
    }

    async fn search_by_username(&self, fragment: &str) -> AuthorResult<Vec<AuthorRecord>> {
        repo::search_by_username(&self.db, fragment).await
    }

    async fn get_all(&self) -> AuthorResult<Vec<AuthorRecord>> {
        repo::get_all(&self.db).await
    }
}
