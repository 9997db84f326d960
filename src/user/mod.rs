mod builder;
mod repository;
mod service;

pub use builder::*;
pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};

/// User as saved on database.
///
/// Verification and reset codes are single-use: they are only selected by
/// the operations that consume them and cleared in the consuming write.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip)]
    pub email_hash: String,
    #[serde(skip)]
    pub email_cipher: String,
    pub email_verified: bool,
    #[serde(skip)]
    #[sqlx(default)]
    pub email_verification_code: Option<String>,
    #[serde(skip)]
    #[sqlx(default)]
    pub password_reset_code: Option<String>,
    pub locale: String,
    pub summary: Option<String>,
    #[serde(skip)]
    pub password: String,
    pub created_at: chrono::NaiveDate,
    pub deleted_at: Option<chrono::NaiveDate>,
}
