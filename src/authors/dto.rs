use serde::{Deserialize, Serialize};

/// Public part of an author returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAuthor {
    pub author_id: String,
    pub author_avatar_url: String,
    pub author_email: String,
    pub author_username: String,
}

/// Request body for sign-up.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[serde(default)]
    pub avatar_url: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthorRequest {
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorSearch {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivationResponse {
    pub message: String,
    pub author: PublicAuthor,
}
