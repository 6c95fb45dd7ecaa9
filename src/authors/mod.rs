use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod repo;
pub mod store;
pub mod validate;

pub use error::{AuthorError, AuthorResult};
pub use model::AuthorRecord;
pub use store::{AuthorStore, AuthorStoreArc, PgAuthorStore};

pub fn router() -> Router<AppState> {
    handlers::author_routes()
}
