use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{AuthorError, AuthorResult};
use super::model::AuthorRecord;
use super::repo::{search_fragment, validated_token};
use super::store::AuthorStore;
use super::validate::{validate_email, validate_username, Field};

/// In-memory author store with the same uniqueness rules as the `author` table.
#[derive(Debug, Default)]
pub struct MemoryAuthorStore {
    authors: RwLock<HashMap<Uuid, AuthorRecord>>,
}

impl MemoryAuthorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(authors: Vec<AuthorRecord>) -> Self {
        Self {
            authors: RwLock::new(authors.into_iter().map(|a| (a.id(), a)).collect()),
        }
    }
}

fn check_unique(
    authors: &HashMap<Uuid, AuthorRecord>,
    candidate: &AuthorRecord,
) -> AuthorResult<()> {
    for other in authors.values().filter(|a| a.id() != candidate.id()) {
        if other.email() == candidate.email() {
            return Err(AuthorError::Conflict(Field::Email));
        }
        if other.username() == candidate.username() {
            return Err(AuthorError::Conflict(Field::Username));
        }
    }
    Ok(())
}

fn sorted(mut authors: Vec<AuthorRecord>) -> Vec<AuthorRecord> {
    authors.sort_by(|a, b| a.username().cmp(b.username()));
    authors
}

#[async_trait]
impl AuthorStore for MemoryAuthorStore {
    async fn insert(&self, author: &AuthorRecord) -> AuthorResult<()> {
        let mut authors = self.authors.write().await;
        if authors.contains_key(&author.id()) {
            return Err(AuthorError::Conflict(Field::Id));
        }
        check_unique(&authors, author)?;
        authors.insert(author.id(), author.clone());
        Ok(())
    }

    async fn update(&self, author: &AuthorRecord) -> AuthorResult<()> {
        let mut authors = self.authors.write().await;
        if !authors.contains_key(&author.id()) {
            return Err(AuthorError::NotFound);
        }
        check_unique(&authors, author)?;
        authors.insert(author.id(), author.clone());
        Ok(())
    }

    async fn delete(&self, author_id: Uuid) -> AuthorResult<()> {
        self.authors
            .write()
            .await
            .remove(&author_id)
            .map(|_| ())
            .ok_or(AuthorError::NotFound)
    }

    async fn get_by_id(&self, author_id: Uuid) -> AuthorResult<AuthorRecord> {
        self.authors
            .read()
            .await
            .get(&author_id)
            .cloned()
            .ok_or(AuthorError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> AuthorResult<AuthorRecord> {
        let email = validate_email(email)?;
        self.authors
            .read()
            .await
            .values()
            .find(|a| a.email() == email)
            .cloned()
            .ok_or(AuthorError::NotFound)
    }

    async fn get_by_username(&self, username: &str) -> AuthorResult<AuthorRecord> {
        let username = validate_username(username)?;
        self.authors
            .read()
            .await
            .values()
            .find(|a| a.username() == username)
            .cloned()
            .ok_or(AuthorError::NotFound)
    }

    async fn get_by_activation_token(&self, token: &str) -> AuthorResult<AuthorRecord> {
        let token = validated_token(token)?;
        self.authors
            .read()
            .await
            .values()
            .find(|a| a.activation_token() == Some(token.as_str()))
            .cloned()
            .ok_or(AuthorError::NotFound)
    }

    async fn search_by_username(&self, fragment: &str) -> AuthorResult<Vec<AuthorRecord>> {
        let fragment = search_fragment(fragment)?;
        let found = self
            .authors
            .read()
            .await
            .values()
            .filter(|a| a.username().contains(fragment.as_str()))
            .cloned()
            .collect();
        Ok(sorted(found))
    }

    async fn get_all(&self) -> AuthorResult<Vec<AuthorRecord>> {
        let all = self.authors.read().await.values().cloned().collect();
        Ok(sorted(all))
    }
}
