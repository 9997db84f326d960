use std::sync::Arc;

use rand::RngCore;
use sqlx::{Pool, Postgres};

use crate::crypto::Crypto;
use crate::error::{Result, ServerError};
use crate::user::{User, UserRepository};

/// Hex length of single-use verification and reset codes.
pub const CODE_LENGTH: u64 = 32;

/// User manager.
#[derive(Clone)]
pub struct UserService {
    pub repo: UserRepository,
    pub crypto: Arc<Crypto>,
    pub data: User,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(user: User, pool: Pool<Postgres>, crypto: Arc<Crypto>) -> Self {
        Self {
            data: user,
            repo: UserRepository::new(pool),
            crypto,
        }
    }

    /// Create builded user.
    ///
    /// Hash password and encrypt email. New accounts start unverified.
    pub async fn create_user(mut self) -> Result<Self> {
        self.data.email_hash = self.crypto.hasher.digest(&self.data.email_hash);
        self.data.email_cipher = self
            .crypto
            .symmetric
            .encrypt_and_hex(&self.data.email_cipher)?;
        self.data.password =
            self.crypto.pwd.hash_password(&self.data.password)?;
        self.data.email_verified = false;

        self.repo.insert(&self.data).await?;
        Ok(self)
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(mut self) -> Result<Self> {
        self.data = self.repo.find_by_id(&self.data.id).await?;
        Ok(self)
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(mut self) -> Result<Self> {
        let email_hash = self.crypto.hasher.digest(&self.data.email_hash);
        self.data = self
            .repo
            .find_by_email(&email_hash)
            .await
            .map_err(|err| match err {
                ServerError::Sql(sqlx::Error::RowNotFound) => {
                    ServerError::UnknownEmail
                },
                err => err,
            })?;
        Ok(self)
    }

    /// Check a password against the stored PHC hash.
    pub fn authenticate(&self, password: &str) -> Result<()> {
        self.crypto
            .pwd
            .verify_password(password, &self.data.password)?;
        Ok(())
    }

    /// Plaintext email address, recovered from the stored cipher.
    pub fn email(&self) -> Result<String> {
        Ok(self
            .crypto
            .symmetric
            .decrypt_from_hex(&self.data.email_cipher)?)
    }

    /// Issue a fresh email verification code.
    ///
    /// The email is flagged unverified until the code is consumed.
    pub async fn issue_verification_code(&mut self) -> Result<String> {
        let code = generate_code();
        self.repo.set_verification_code(&self.data.id, &code).await?;

        self.data.email_verified = false;
        self.data.email_verification_code = Some(code.clone());
        Ok(code)
    }

    /// Consume an email verification code.
    ///
    /// A matching code flags the email verified and clears the code so it
    /// cannot be replayed. A stale code on an already-verified account is a
    /// no-op rather than an error.
    pub async fn verify_email(&mut self, code: &str) -> Result<()> {
        let stored = self.repo.find_by_id_with_codes(&self.data.id).await?;

        if code_matches(stored.email_verification_code.as_deref(), code) {
            self.repo.confirm_email(&self.data.id).await?;
            self.data.email_verified = true;
            self.data.email_verification_code = None;
            Ok(())
        } else if !stored.email_verified {
            Err(ServerError::CodeMismatch)
        } else {
            Ok(())
        }
    }

    /// Issue a fresh password reset code.
    pub async fn issue_reset_code(&mut self) -> Result<String> {
        let code = generate_code();
        self.repo.set_reset_code(&self.data.id, &code).await?;

        self.data.password_reset_code = Some(code.clone());
        Ok(code)
    }

    /// Consume a password reset code and set a new password.
    ///
    /// The code is cleared in the same write that updates the password, so
    /// a consumed code never matches again.
    pub async fn reset_password(
        &mut self,
        code: &str,
        new_password: &str,
    ) -> Result<()> {
        let stored = self.repo.find_by_id_with_codes(&self.data.id).await?;

        if !code_matches(stored.password_reset_code.as_deref(), code) {
            return Err(ServerError::ResetRefused);
        }

        let hash = self.crypto.pwd.hash_password(new_password)?;
        self.repo.reset_password(&self.data.id, &hash).await?;

        self.data.password = hash;
        self.data.password_reset_code = None;
        Ok(())
    }
}

/// Generate a single-use code: 16 CSPRNG bytes, hex-encoded.
fn generate_code() -> String {
    let mut bytes = [0u8; (CODE_LENGTH / 2) as usize];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// An absent (already consumed) code never matches.
fn code_matches(stored: Option<&str>, presented: &str) -> bool {
    stored.is_some_and(|code| code == presented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code() {
        let code = generate_code();
        assert_eq!(code.len() as u64, CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));

        // Two draws must not collide.
        assert_ne!(code, generate_code());
    }

    #[test]
    fn test_code_matches() {
        assert!(code_matches(Some("deadbeef"), "deadbeef"));
        assert!(!code_matches(Some("deadbeef"), "deadbeef0"));
        assert!(!code_matches(Some("deadbeef"), ""));

        // Consumed codes are cleared and must never match again.
        assert!(!code_matches(None, "deadbeef"));
        assert!(!code_matches(None, ""));
    }
}
