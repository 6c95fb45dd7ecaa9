use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    authors::{
        dto::{ActivationResponse, AuthorSearch, PublicAuthor, SignUpRequest, UpdateAuthorRequest},
        error::AuthorError,
        model::AuthorRecord,
        validate::validate_uuid,
    },
    credentials::{hash_password, new_activation_token},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

type ApiError = (StatusCode, String);

pub fn author_routes() -> Router<AppState> {
    Router::new()
        .route("/authors", get(list_authors).post(sign_up))
        .route(
            "/authors/:id",
            get(get_author).put(update_author).delete(delete_author),
        )
        .route("/authors/email/:email", get(get_author_by_email))
        .route("/authors/username/:username", get(get_author_by_username))
        .route("/activation/:token", get(activate))
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<PublicAuthor>), ApiError> {
    check_password(&payload.password)?;
    if payload.password != payload.password_confirm {
        warn!("password confirmation mismatch");
        return Err((
            StatusCode::BAD_REQUEST,
            "Passwords do not match".into(),
        ));
    }

    let hash = hash_in_background(payload.password).await?;
    let token = new_activation_token();
    let author = AuthorRecord::new(
        Uuid::new_v4(),
        &payload.avatar_url,
        Some(&token),
        &payload.email.trim().to_lowercase(),
        &hash,
        &payload.username,
    )
    .map_err(AuthorError::from)?;

    state.store.insert(&author).await?;

    info!(author_id = %author.id(), "author signed up");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/v1/authors/{}", author.id()))],
        Json(author.to_public_view()),
    ))
}

#[instrument(skip(state))]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(search): Query<AuthorSearch>,
) -> Result<Json<Vec<PublicAuthor>>, ApiError> {
    let authors = match search.username.as_deref() {
        Some(fragment) => state.store.search_by_username(fragment).await?,
        None => state.store.get_all().await?,
    };
    Ok(Json(
        authors.iter().map(AuthorRecord::to_public_view).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicAuthor>, ApiError> {
    let id = validate_uuid(id.as_str()).map_err(AuthorError::from)?;
    let author = state.store.get_by_id(id).await?;
    Ok(Json(author.to_public_view()))
}

#[instrument(skip(state))]
pub async fn get_author_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<PublicAuthor>, ApiError> {
    let author = state.store.get_by_email(&email.to_lowercase()).await?;
    Ok(Json(author.to_public_view()))
}

#[instrument(skip(state))]
pub async fn get_author_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicAuthor>, ApiError> {
    let author = state.store.get_by_username(&username).await?;
    Ok(Json(author.to_public_view()))
}

#[instrument(skip(state, payload))]
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAuthorRequest>,
) -> Result<Json<PublicAuthor>, ApiError> {
    let id = validate_uuid(id.as_str()).map_err(AuthorError::from)?;
    let mut author = state.store.get_by_id(id).await?;

    if let Some(avatar_url) = payload.avatar_url.as_deref() {
        author.set_avatar_url(avatar_url).map_err(AuthorError::from)?;
    }
    if let Some(email) = payload.email.as_deref() {
        author
            .set_email(&email.trim().to_lowercase())
            .map_err(AuthorError::from)?;
    }
    if let Some(username) = payload.username.as_deref() {
        author.set_username(username).map_err(AuthorError::from)?;
    }
    if let Some(password) = payload.password {
        check_password(&password)?;
        let hash = hash_in_background(password).await?;
        author.set_password_hash(&hash).map_err(AuthorError::from)?;
    }

    state.store.update(&author).await?;

    info!(author_id = %author.id(), "author updated");
    Ok(Json(author.to_public_view()))
}

#[instrument(skip(state))]
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = validate_uuid(id.as_str()).map_err(AuthorError::from)?;
    state.store.delete(id).await?;
    info!(author_id = %id, "author deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, token))]
pub async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ActivationResponse>, ApiError> {
    let mut author = state.store.get_by_activation_token(&token).await?;
    author.set_activation_token(None).map_err(AuthorError::from)?;
    state.store.update(&author).await?;

    info!(author_id = %author.id(), "author activated");
    Ok(Json(ActivationResponse {
        message: "Account activated".into(),
        author: author.to_public_view(),
    }))
}

fn check_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }
    Ok(())
}

async fn hash_in_background(password: String) -> Result<String, ApiError> {
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|res| res);
    hashed.map_err(|e| {
        error!(error = %e, "hash_password failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up_request(username: &str, email: &str) -> SignUpRequest {
        SignUpRequest {
            avatar_url: "https://avatars.example.com/me.png".into(),
            email: email.into(),
            username: username.into(),
            password: "correct-horse-battery".into(),
            password_confirm: "correct-horse-battery".into(),
        }
    }

    async fn signed_up(state: &AppState, username: &str) -> PublicAuthor {
        let email = format!("{}@example.com", username);
        let (status, _, Json(author)) =
            sign_up(State(state.clone()), Json(sign_up_request(username, &email)))
                .await
                .expect("sign up should succeed");
        assert_eq!(status, StatusCode::CREATED);
        author
    }

    #[tokio::test]
    async fn sign_up_creates_pending_author() {
        let state = AppState::fake();
        let (status, [(name, location)], Json(view)) = sign_up(
            State(state.clone()),
            Json(sign_up_request("Lariah", " Lariah@Example.COM ")),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(name, header::LOCATION);
        assert_eq!(location, format!("/api/v1/authors/{}", view.author_id));
        assert_eq!(view.author_email, "lariah@example.com");
        assert_eq!(view.author_username, "Lariah");

        let id = validate_uuid(view.author_id.as_str()).unwrap();
        let stored = state.store.get_by_id(id).await.unwrap();
        assert!(!stored.is_activated());
        assert!(stored.password_hash().starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn sign_up_rejects_bad_input() {
        let state = AppState::fake();

        let mut short = sign_up_request("shorty", "shorty@example.com");
        short.password = "short".into();
        short.password_confirm = "short".into();
        let (status, _) = sign_up(State(state.clone()), Json(short)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut mismatch = sign_up_request("mismatch", "mismatch@example.com");
        mismatch.password_confirm = "something-else".into();
        let (status, body) = sign_up(State(state.clone()), Json(mismatch)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Passwords do not match");

        let bad_email = sign_up_request("bademail", "not-an-email");
        let (status, body) = sign_up(State(state.clone()), Json(bad_email)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("authorEmail"));

        assert!(state.store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_up_conflicts_on_duplicate_email_or_username() {
        let state = AppState::fake();
        signed_up(&state, "taken").await;

        let (status, body) = sign_up(
            State(state.clone()),
            Json(sign_up_request("fresh", "taken@example.com")),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("authorEmail"));

        let (status, _) = sign_up(
            State(state.clone()),
            Json(sign_up_request("taken", "fresh@example.com")),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn lookups_by_id_email_and_username() {
        let state = AppState::fake();
        let created = signed_up(&state, "finder").await;

        let Json(by_id) = get_author(State(state.clone()), Path(created.author_id.clone()))
            .await
            .unwrap();
        let Json(by_email) =
            get_author_by_email(State(state.clone()), Path("FINDER@example.com".into()))
                .await
                .unwrap();
        let Json(by_name) = get_author_by_username(State(state.clone()), Path("finder".into()))
            .await
            .unwrap();
        assert_eq!(by_id, created);
        assert_eq!(by_email, created);
        assert_eq!(by_name, created);

        let (status, _) = get_author(State(state.clone()), Path("not-a-uuid".into()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_author(State(state.clone()), Path(Uuid::new_v4().to_string()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_and_search() {
        let state = AppState::fake();
        signed_up(&state, "carol_poet").await;
        signed_up(&state, "alice_poet").await;
        signed_up(&state, "dave").await;

        let Json(all) = list_authors(State(state.clone()), Query(AuthorSearch::default()))
            .await
            .unwrap();
        let names: Vec<_> = all.iter().map(|a| a.author_username.as_str()).collect();
        assert_eq!(names, ["alice_poet", "carol_poet", "dave"]);

        let Json(poets) = list_authors(
            State(state.clone()),
            Query(AuthorSearch {
                username: Some("_poet".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(poets.len(), 2);
    }

    #[tokio::test]
    async fn update_changes_fields_and_validates() {
        let state = AppState::fake();
        let created = signed_up(&state, "editor").await;
        let id = validate_uuid(created.author_id.as_str()).unwrap();
        let old_hash = state.store.get_by_id(id).await.unwrap().password_hash().to_string();

        let Json(updated) = update_author(
            State(state.clone()),
            Path(created.author_id.clone()),
            Json(UpdateAuthorRequest {
                username: Some("  editor2 ".into()),
                password: Some("another-long-password".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.author_username, "editor2");
        assert_eq!(updated.author_email, created.author_email);

        let stored = state.store.get_by_id(id).await.unwrap();
        assert_ne!(stored.password_hash(), old_hash);

        let (status, _) = update_author(
            State(state.clone()),
            Path(created.author_id.clone()),
            Json(UpdateAuthorRequest {
                username: Some("x".repeat(33)),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.store.get_by_id(id).await.unwrap().username(), "editor2");
    }

    #[tokio::test]
    async fn delete_then_not_found() {
        let state = AppState::fake();
        let created = signed_up(&state, "leaving").await;

        let status = delete_author(State(state.clone()), Path(created.author_id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = delete_author(State(state.clone()), Path(created.author_id.clone()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn activation_clears_token_once() {
        let state = AppState::fake();
        let created = signed_up(&state, "activator").await;
        let id = validate_uuid(created.author_id.as_str()).unwrap();
        let token = state
            .store
            .get_by_id(id)
            .await
            .unwrap()
            .activation_token()
            .expect("pending token")
            .to_string();

        let Json(resp) = activate(State(state.clone()), Path(token.clone()))
            .await
            .unwrap();
        assert_eq!(resp.author, created);
        assert!(state.store.get_by_id(id).await.unwrap().is_activated());

        let (status, _) = activate(State(state.clone()), Path(token)).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = activate(State(state.clone()), Path("ZZZZ".into()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
