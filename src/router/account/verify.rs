//! Email verification endpoints.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::mail::Template::VerifyEmail;
use crate::router::Valid;
use crate::user::{CODE_LENGTH, UserService};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(equal = CODE_LENGTH))]
    code: String,
}

/// Issue a fresh verification code and mail it to the bearer's address.
pub async fn send_handler(
    State(state): State<AppState>,
    Extension(mut user): Extension<UserService>,
) -> Result<()> {
    let email = user.email()?;
    let code = user.issue_verification_code().await?;

    state
        .mail
        .publish_event(VerifyEmail, &email, &user.data, &code)
        .await?;

    Ok(())
}

/// Consume an emailed verification code for the bearer's account.
///
/// A wrong code on an unverified account is rejected; a stale code on an
/// already-verified account is accepted as a no-op.
pub async fn handler(
    Extension(mut user): Extension<UserService>,
    Valid(body): Valid<Body>,
) -> Result<Json<()>> {
    user.verify_email(&body.code).await?;
    Ok(Json(()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::*;

    #[tokio::test]
    async fn test_verify_requires_authorization() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/account/verify",
            json!({"code": "0".repeat(32)}).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_send_requires_authorization() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/account/verify/send",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
