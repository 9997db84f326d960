//! Handle database requests.

use sqlx::{Pool, Postgres};

use crate::error::Result;
use crate::user::User;

const PUBLIC_COLUMNS: &str = r#"id, username, email_hash, email_cipher,
    email_verified, locale, summary, password, created_at, deleted_at"#;

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database.
    pub async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users
                (id, username, locale, email_hash, email_cipher, email_verified, password)
                VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(user.id.to_lowercase())
        .bind(&user.username)
        .bind(&user.locale)
        .bind(&user.email_hash)
        .bind(&user.email_cipher)
        .bind(user.email_verified)
        .bind(&user.password)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, user_id: &str) -> Result<User> {
        let query = get_by_field_query(Field::Id, false);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        if let Some(date) = user.deleted_at {
            return Err(crate::error::ServerError::UserDeleted { date });
        };

        Ok(user)
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(&self, email_hash: &str) -> Result<User> {
        let query = get_by_field_query(Field::Email, false);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email_hash)
            .fetch_one(&self.pool)
            .await?;

        if let Some(date) = user.deleted_at {
            return Err(crate::error::ServerError::UserDeleted { date });
        };

        Ok(user)
    }

    /// Find current user using `id` field, selecting the single-use codes
    /// the public projections leave out.
    pub async fn find_by_id_with_codes(&self, user_id: &str) -> Result<User> {
        let query = get_by_field_query(Field::Id, true);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        if let Some(date) = user.deleted_at {
            return Err(crate::error::ServerError::UserDeleted { date });
        };

        Ok(user)
    }

    /// Update current user's profile data.
    pub async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET username = $1, summary = $2, email_hash = $3,
                    email_cipher = $4, email_verified = $5
                WHERE id = $6"#,
        )
        .bind(&user.username)
        .bind(&user.summary)
        .bind(&user.email_hash)
        .bind(&user.email_cipher)
        .bind(user.email_verified)
        .bind(&user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a fresh email verification code and mark the email unverified
    /// until it is consumed.
    pub async fn set_verification_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET email_verification_code = $1, email_verified = FALSE
                WHERE id = $2"#,
        )
        .bind(code)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Consume the verification code: flag the email verified and clear the
    /// code in the same write.
    pub async fn confirm_email(&self, user_id: &str) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET email_verified = TRUE, email_verification_code = NULL
                WHERE id = $1"#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a fresh password reset code.
    pub async fn set_reset_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE users SET password_reset_code = $1 WHERE id = $2"#,
        )
        .bind(code)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Consume the reset code: set the new password hash and clear the code
    /// in the same write.
    pub async fn reset_password(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET password = $1, password_reset_code = NULL
                WHERE id = $2"#,
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Field {
    Id,
    Email,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Email => write!(f, "email_hash"),
        }
    }
}

fn get_by_field_query(field: Field, with_codes: bool) -> String {
    let codes = if with_codes {
        ", email_verification_code, password_reset_code"
    } else {
        ""
    };

    format!(r#"SELECT {PUBLIC_COLUMNS}{codes} FROM users WHERE {field} = $1"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_projection() {
        let query = get_by_field_query(Field::Id, false);
        assert!(query.contains("WHERE id = $1"));
        assert!(!query.contains("email_verification_code"));

        let query = get_by_field_query(Field::Email, true);
        assert!(query.contains("WHERE email_hash = $1"));
        assert!(query.contains("email_verification_code"));
        assert!(query.contains("password_reset_code"));
    }
}
