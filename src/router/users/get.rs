//! Public profile view.

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::user::UserService;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    id: String,
    username: String,
    summary: Option<String>,
    locale: String,
    email_verified: bool,
    created_at: String,
}

pub async fn handler(
    Extension(user): Extension<UserService>,
) -> Result<Json<Response>> {
    Ok(Json(Response {
        id: user.data.id.clone(),
        username: user.data.username.clone(),
        summary: user.data.summary.clone(),
        locale: user.data.locale.clone(),
        email_verified: user.data.email_verified,
        created_at: user.data.created_at.to_string(),
    }))
}
