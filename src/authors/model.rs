use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::dto::PublicAuthor;
use super::validate::{
    validate_activation_token, validate_avatar_url, validate_email, validate_password_hash,
    validate_username, validate_uuid, UuidInput, ValidationError,
};

/// A validated author account.
///
/// Every field goes through its setter, so an `AuthorRecord` that exists is
/// always valid. Serialising it yields the public view only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "PublicAuthor")]
pub struct AuthorRecord {
    id: Uuid,
    avatar_url: String,
    activation_token: Option<String>,
    email: String,
    password_hash: String,
    username: String,
}

/// Row of the `author` table, in column order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct AuthorRow {
    pub author_id: Uuid,
    pub author_avatar_url: String,
    pub author_activation_token: Option<String>,
    pub author_email: String,
    pub author_hash: String,
    pub author_username: String,
}

impl AuthorRecord {
    /// Builds an author, stopping at the first invalid field.
    pub fn new<'a>(
        id: impl Into<UuidInput<'a>>,
        avatar_url: &str,
        activation_token: Option<&str>,
        email: &str,
        password_hash: &str,
        username: &str,
    ) -> Result<Self, ValidationError> {
        let mut author = Self {
            id: Uuid::nil(),
            avatar_url: String::new(),
            activation_token: None,
            email: String::new(),
            password_hash: String::new(),
            username: String::new(),
        };
        author.set_id(id)?;
        author.set_avatar_url(avatar_url)?;
        author.set_activation_token(activation_token)?;
        author.set_email(email)?;
        author.set_password_hash(password_hash)?;
        author.set_username(username)?;
        Ok(author)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn avatar_url(&self) -> &str {
        &self.avatar_url
    }

    pub fn activation_token(&self) -> Option<&str> {
        self.activation_token.as_deref()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// An account with no pending token has been activated.
    pub fn is_activated(&self) -> bool {
        self.activation_token.is_none()
    }

    // id is fixed once constructed
    fn set_id<'a>(&mut self, value: impl Into<UuidInput<'a>>) -> Result<(), ValidationError> {
        self.id = validate_uuid(value)?;
        Ok(())
    }

    pub fn set_avatar_url(&mut self, value: &str) -> Result<(), ValidationError> {
        self.avatar_url = validate_avatar_url(value)?;
        Ok(())
    }

    pub fn set_activation_token(&mut self, value: Option<&str>) -> Result<(), ValidationError> {
        self.activation_token = validate_activation_token(value)?;
        Ok(())
    }

    pub fn set_email(&mut self, value: &str) -> Result<(), ValidationError> {
        self.email = validate_email(value)?;
        Ok(())
    }

    pub fn set_password_hash(&mut self, value: &str) -> Result<(), ValidationError> {
        self.password_hash = validate_password_hash(value)?;
        Ok(())
    }

    pub fn set_username(&mut self, value: &str) -> Result<(), ValidationError> {
        self.username = validate_username(value)?;
        Ok(())
    }

    pub fn to_row(&self) -> AuthorRow {
        AuthorRow {
            author_id: self.id,
            author_avatar_url: self.avatar_url.clone(),
            author_activation_token: self.activation_token.clone(),
            author_email: self.email.clone(),
            author_hash: self.password_hash.clone(),
            author_username: self.username.clone(),
        }
    }

    /// What may leave the service: no hash, no activation token.
    pub fn to_public_view(&self) -> PublicAuthor {
        self.clone().into()
    }
}

/// Stored rows are validated again on the way in.
impl TryFrom<AuthorRow> for AuthorRecord {
    type Error = ValidationError;

    fn try_from(row: AuthorRow) -> Result<Self, Self::Error> {
        AuthorRecord::new(
            row.author_id,
            &row.author_avatar_url,
            row.author_activation_token.as_deref(),
            &row.author_email,
            &row.author_hash,
            &row.author_username,
        )
    }
}

impl From<AuthorRecord> for PublicAuthor {
    fn from(author: AuthorRecord) -> Self {
        PublicAuthor {
            author_id: author.id.to_string(),
            author_avatar_url: author.avatar_url,
            author_email: author.email,
            author_username: author.username,
        }
    }
}
