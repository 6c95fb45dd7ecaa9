use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use rand::{rngs::OsRng, RngCore};
use tracing::error;

use crate::authors::validate::ACTIVATION_TOKEN_LENGTH;

/// Hashes a plain password with Argon2id and the default parameters.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Fresh lower-case hex token for account activation.
pub fn new_activation_token() -> String {
    let mut bytes = [0u8; ACTIVATION_TOKEN_LENGTH / 2];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authors::validate::{validate_activation_token, validate_password_hash};

    #[test]
    fn hash_has_the_accepted_shape() {
        let hash = hash_password("Secur3P@ssw0rd!").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert_eq!(validate_password_hash(&hash).unwrap(), hash);
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn activation_token_is_valid_and_random() {
        let token = new_activation_token();
        assert_eq!(token.len(), ACTIVATION_TOKEN_LENGTH);
        assert_eq!(
            validate_activation_token(Some(&token)).unwrap().as_deref(),
            Some(token.as_str())
        );
        assert_ne!(token, new_activation_token());
    }
}
