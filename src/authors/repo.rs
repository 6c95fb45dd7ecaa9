use sqlx::PgExecutor;
use uuid::Uuid;

use super::error::{AuthorError, AuthorResult};
use super::model::{AuthorRecord, AuthorRow};
use super::validate::{
    escape_like, sanitize_text, validate_activation_token, validate_email, validate_username,
    Field, ValidationError,
};

// Every function issues exactly one statement and accepts a pool or a transaction.

pub async fn insert<'e, E>(db: E, author: &AuthorRecord) -> AuthorResult<()>
where
    E: PgExecutor<'e>,
{
    let AuthorRow {
        author_id,
        author_avatar_url,
        author_activation_token,
        author_email,
        author_hash,
        author_username,
    } = author.to_row();

    sqlx::query(
        r#"
        INSERT INTO author ("authorId", "authorAvatarUrl", "authorActivationToken",
                            "authorEmail", "authorHash", "authorUsername")
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(author_id)
    .bind(author_avatar_url)
    .bind(author_activation_token) // None → NULL
    .bind(author_email)
    .bind(author_hash)
    .bind(author_username)
    .execute(db)
    .await
    .map_err(AuthorError::storage("insert author"))?;

    Ok(())
}

pub async fn update<'e, E>(db: E, author: &AuthorRecord) -> AuthorResult<()>
where
    E: PgExecutor<'e>,
{
    let row = author.to_row();
    let result = sqlx::query(
        r#"
        UPDATE author
           SET "authorAvatarUrl" = $2,
               "authorActivationToken" = $3,
               "authorEmail" = $4,
               "authorHash" = $5,
               "authorUsername" = $6
         WHERE "authorId" = $1
        "#,
    )
    .bind(row.author_id)
    .bind(row.author_avatar_url)
    .bind(row.author_activation_token)
    .bind(row.author_email)
    .bind(row.author_hash)
    .bind(row.author_username)
    .execute(db)
    .await
    .map_err(AuthorError::storage("update author"))?;

    if result.rows_affected() == 0 {
        return Err(AuthorError::NotFound);
    }
    Ok(())
}

pub async fn delete<'e, E>(db: E, author_id: Uuid) -> AuthorResult<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(r#"DELETE FROM author WHERE "authorId" = $1"#)
        .bind(author_id)
        .execute(db)
        .await
        .map_err(AuthorError::storage("delete author"))?;

    if result.rows_affected() == 0 {
        return Err(AuthorError::NotFound);
    }
    Ok(())
}

pub async fn get_by_id<'e, E>(db: E, author_id: Uuid) -> AuthorResult<AuthorRecord>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, AuthorRow>(
        r#"
        SELECT "authorId", "authorAvatarUrl", "authorActivationToken",
               "authorEmail", "authorHash", "authorUsername"
          FROM author
         WHERE "authorId" = $1
        "#,
    )
    .bind(author_id)
    .fetch_optional(db)
    .await
    .map_err(AuthorError::storage("select author by id"))?;

    rehydrate_one(row)
}

pub async fn get_by_email<'e, E>(db: E, email: &str) -> AuthorResult<AuthorRecord>
where
    E: PgExecutor<'e>,
{
    let email = validate_email(email)?;
    let row = sqlx::query_as::<_, AuthorRow>(
        r#"
        SELECT "authorId", "authorAvatarUrl", "authorActivationToken",
               "authorEmail", "authorHash", "authorUsername"
          FROM author
         WHERE "authorEmail" = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await
    .map_err(AuthorError::storage("select author by email"))?;

    rehydrate_one(row)
}

pub async fn get_by_username<'e, E>(db: E, username: &str) -> AuthorResult<AuthorRecord>
where
    E: PgExecutor<'e>,
{
    let username = validate_username(username)?;
    let row = sqlx::query_as::<_, AuthorRow>(
        r#"
        SELECT "authorId", "authorAvatarUrl", "authorActivationToken",
               "authorEmail", "authorHash", "authorUsername"
          FROM author
         WHERE "authorUsername" = $1
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await
    .map_err(AuthorError::storage("select author by username"))?;

    rehydrate_one(row)
}

pub async fn get_by_activation_token<'e, E>(db: E, token: &str) -> AuthorResult<AuthorRecord>
where
    E: PgExecutor<'e>,
{
    let token = validated_token(token)?;
    let row = sqlx::query_as::<_, AuthorRow>(
        r#"
        SELECT "authorId", "authorAvatarUrl", "authorActivationToken",
               "authorEmail", "authorHash", "authorUsername"
          FROM author
         WHERE "authorActivationToken" = $1
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await
    .map_err(AuthorError::storage("select author by activation token"))?;

    rehydrate_one(row)
}

/// Authors whose username contains `fragment` literally.
pub async fn search_by_username<'e, E>(db: E, fragment: &str) -> AuthorResult<Vec<AuthorRecord>>
where
    E: PgExecutor<'e>,
{
    let fragment = search_fragment(fragment)?;
    let rows = sqlx::query_as::<_, AuthorRow>(
        r#"
        SELECT "authorId", "authorAvatarUrl", "authorActivationToken",
               "authorEmail", "authorHash", "authorUsername"
          FROM author
         WHERE "authorUsername" LIKE $1
         ORDER BY "authorUsername"
        "#,
    )
    .bind(format!("%{}%", escape_like(&fragment)))
    .fetch_all(db)
    .await
    .map_err(AuthorError::storage("search authors by username"))?;

    rehydrate_all(rows)
}

pub async fn get_all<'e, E>(db: E) -> AuthorResult<Vec<AuthorRecord>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, AuthorRow>(
        r#"
        SELECT "authorId", "authorAvatarUrl", "authorActivationToken",
               "authorEmail", "authorHash", "authorUsername"
          FROM author
         ORDER BY "authorUsername"
        "#,
    )
    .fetch_all(db)
    .await
    .map_err(AuthorError::storage("select all authors"))?;

    rehydrate_all(rows)
}

/// Token lookups take a concrete token; "no token" is not searchable.
pub(crate) fn validated_token(token: &str) -> AuthorResult<String> {
    validate_activation_token(Some(token))?.ok_or(AuthorError::Validation(
        ValidationError::InvalidFormat {
            field: Field::ActivationToken,
        },
    ))
}

pub(crate) fn search_fragment(fragment: &str) -> AuthorResult<String> {
    let fragment = sanitize_text(fragment);
    if fragment.is_empty() {
        return Err(ValidationError::EmptyOrInsecure {
            field: Field::Username,
        }
        .into());
    }
    Ok(fragment)
}

fn rehydrate_one(row: Option<AuthorRow>) -> AuthorResult<AuthorRecord> {
    let row = row.ok_or(AuthorError::NotFound)?;
    AuthorRecord::try_from(row).map_err(AuthorError::CorruptRow)
}

fn rehydrate_all(rows: Vec<AuthorRow>) -> AuthorResult<Vec<AuthorRecord>> {
    rows.into_iter()
        .map(AuthorRecord::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AuthorError::CorruptRow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authors::model::tests::sample_author;

    #[test]
    fn token_lookup_requires_hex_token() {
        assert!(matches!(
            validated_token("ZZZZ"),
            Err(AuthorError::Validation(ValidationError::InvalidFormat { .. }))
        ));
        let token = "ABCDEF0123456789abcdef0123456789";
        assert_eq!(validated_token(token).unwrap(), token.to_lowercase());
    }

    #[test]
    fn search_fragment_rejects_blank() {
        assert!(search_fragment("  <b></b> ").is_err());
        assert_eq!(search_fragment(" li_r ").unwrap(), "li_r");
    }

    #[test]
    fn rehydrate_reports_missing_and_corrupt_rows() {
        assert!(matches!(rehydrate_one(None), Err(AuthorError::NotFound)));

        let good = sample_author("rehydrated");
        assert_eq!(rehydrate_one(Some(good.to_row())).unwrap(), good);

        let mut bad = good.to_row();
        bad.author_email = "broken".into();
        assert!(matches!(
            rehydrate_all(vec![good.to_row(), bad]),
            Err(AuthorError::CorruptRow(_))
        ));
    }
}
