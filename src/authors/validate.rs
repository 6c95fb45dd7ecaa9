use std::fmt;

use argon2::{Algorithm, PasswordHash};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

pub const AVATAR_URL_MAX_LEN: usize = 255;
pub const EMAIL_MAX_LEN: usize = 128;
pub const USERNAME_MAX_LEN: usize = 32;
/// Length of a PHC-encoded Argon2 hash produced with the default parameters.
pub const PASSWORD_HASH_LEN: usize = 97;
/// Activation tokens are 16 random bytes rendered as lower-case hex.
pub const ACTIVATION_TOKEN_LENGTH: usize = 32;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*(>|$)").unwrap();
    static ref TOKEN_RE: Regex =
        Regex::new(&format!("^[0-9a-f]{{{}}}$", ACTIVATION_TOKEN_LENGTH)).unwrap();
}

/// Author attribute a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    AvatarUrl,
    ActivationToken,
    Email,
    PasswordHash,
    Username,
}

impl Field {
    /// Column name in the `author` table.
    pub fn column(self) -> &'static str {
        match self {
            Field::Id => "authorId",
            Field::AvatarUrl => "authorAvatarUrl",
            Field::ActivationToken => "authorActivationToken",
            Field::Email => "authorEmail",
            Field::PasswordHash => "authorHash",
            Field::Username => "authorUsername",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is empty or insecure")]
    EmptyOrInsecure { field: Field },
    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: Field, max: usize },
    #[error("{field} has an invalid format")]
    InvalidFormat { field: Field },
    #[error("{field} must be exactly {expected} characters")]
    InvalidLength { field: Field, expected: usize },
    #[error("invalid identifier")]
    InvalidIdentifier,
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::EmptyOrInsecure { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field }
            | ValidationError::InvalidLength { field, .. } => *field,
            ValidationError::InvalidIdentifier => Field::Id,
        }
    }
}

/// Anything an author id may be supplied as.
#[derive(Debug, Clone, Copy)]
pub enum UuidInput<'a> {
    Uuid(Uuid),
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl From<Uuid> for UuidInput<'_> {
    fn from(id: Uuid) -> Self {
        UuidInput::Uuid(id)
    }
}

impl<'a> From<&'a str> for UuidInput<'a> {
    fn from(text: &'a str) -> Self {
        UuidInput::Text(text)
    }
}

impl<'a> From<&'a String> for UuidInput<'a> {
    fn from(text: &'a String) -> Self {
        UuidInput::Text(text.as_str())
    }
}

impl<'a> From<&'a [u8]> for UuidInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        UuidInput::Bytes(bytes)
    }
}

/// Accepts a structured UUID, its canonical hyphenated text form or its 16 raw bytes.
pub fn validate_uuid<'a>(value: impl Into<UuidInput<'a>>) -> Result<Uuid, ValidationError> {
    match value.into() {
        UuidInput::Uuid(id) => Ok(id),
        UuidInput::Text(text) => {
            let text = text.trim();
            // only the 36-char hyphenated form, not simple/braced/urn
            if text.len() != 36 {
                return Err(ValidationError::InvalidIdentifier);
            }
            Uuid::try_parse(text).map_err(|_| ValidationError::InvalidIdentifier)
        }
        UuidInput::Bytes(bytes) => {
            Uuid::from_slice(bytes).map_err(|_| ValidationError::InvalidIdentifier)
        }
    }
}

/// Strips markup and control characters from free text.
pub fn sanitize_text(value: &str) -> String {
    TAG_RE
        .replace_all(value.trim(), "")
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Keeps only RFC 3986 unreserved and reserved characters plus `%`.
pub fn sanitize_url(value: &str) -> String {
    const ALLOWED: &str = "-._~:/?#[]@!$&'()*+,;=%";
    value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || ALLOWED.contains(*c))
        .collect()
}

pub fn validate_avatar_url(value: &str) -> Result<String, ValidationError> {
    let url = sanitize_url(value);
    if url.chars().count() > AVATAR_URL_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: Field::AvatarUrl,
            max: AVATAR_URL_MAX_LEN,
        });
    }
    Ok(url)
}

/// `None` means no activation is pending.
pub fn validate_activation_token(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let token = raw.trim().to_ascii_lowercase();
    if !TOKEN_RE.is_match(&token) {
        return Err(ValidationError::InvalidFormat {
            field: Field::ActivationToken,
        });
    }
    Ok(Some(token))
}

pub fn validate_email(value: &str) -> Result<String, ValidationError> {
    let email = value.trim();
    if email.is_empty() || !EMAIL_RE.is_match(email) {
        return Err(ValidationError::EmptyOrInsecure {
            field: Field::Email,
        });
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: Field::Email,
            max: EMAIL_MAX_LEN,
        });
    }
    Ok(email.to_string())
}

/// Checks the shape of a PHC hash string. The hash itself is opaque here.
pub fn validate_password_hash(value: &str) -> Result<String, ValidationError> {
    let hash = value.trim();
    if hash.is_empty() {
        return Err(ValidationError::EmptyOrInsecure {
            field: Field::PasswordHash,
        });
    }
    let is_argon2 = PasswordHash::new(hash)
        .map(|parsed| Algorithm::try_from(parsed.algorithm).is_ok())
        .unwrap_or(false);
    if !is_argon2 {
        return Err(ValidationError::InvalidFormat {
            field: Field::PasswordHash,
        });
    }
    if hash.chars().count() != PASSWORD_HASH_LEN {
        return Err(ValidationError::InvalidLength {
            field: Field::PasswordHash,
            expected: PASSWORD_HASH_LEN,
        });
    }
    Ok(hash.to_string())
}

pub fn validate_username(value: &str) -> Result<String, ValidationError> {
    let username = sanitize_text(value);
    if username.is_empty() {
        return Err(ValidationError::EmptyOrInsecure {
            field: Field::Username,
        });
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: Field::Username,
            max: USERNAME_MAX_LEN,
        });
    }
    Ok(username)
}

/// Escapes LIKE wildcards so user input matches literally.
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
