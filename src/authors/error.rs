use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, warn};

use super::validate::{Field, ValidationError};

#[derive(Debug, Error)]
pub enum AuthorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("author not found")]
    NotFound,

    #[error("{0} already taken")]
    Conflict(Field),

    /// A stored row no longer passes validation.
    #[error("stored author row is invalid: {0}")]
    CorruptRow(#[source] ValidationError),

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

pub type AuthorResult<T> = Result<T, AuthorError>;

impl AuthorError {
    /// Wraps a driver error, turning unique violations into `Conflict`.
    pub(crate) fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| {
            if let sqlx::Error::Database(db) = &source {
                if db.is_unique_violation() {
                    match db.constraint() {
                        Some("author_pkey") => return AuthorError::Conflict(Field::Id),
                        Some("author_email_unique") => return AuthorError::Conflict(Field::Email),
                        Some("author_username_unique") => {
                            return AuthorError::Conflict(Field::Username)
                        }
                        _ => {}
                    }
                }
            }
            AuthorError::Storage { context, source }
        }
    }
}

impl From<AuthorError> for (StatusCode, String) {
    fn from(err: AuthorError) -> Self {
        match &err {
            AuthorError::Validation(e) => {
                warn!(error = %e, field = %e.field(), "rejected author input");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AuthorError::NotFound => (StatusCode::NOT_FOUND, "Author not found".into()),
            AuthorError::Conflict(field) => {
                warn!(%field, "unique constraint violated");
                (StatusCode::CONFLICT, err.to_string())
            }
            AuthorError::CorruptRow(_) | AuthorError::Storage { .. } => {
                error!(error = %err, "author storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        }
    }
}
