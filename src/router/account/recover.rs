//! Password recovery endpoints.

use axum::extract::State;
use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::AppState;
use crate::error::Result;
use crate::mail::Template::PasswordReset;
use crate::router::Valid;
use crate::user::{CODE_LENGTH, UserBuilder};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct ConfirmBody {
    #[zeroize(skip)]
    id: String,
    #[validate(length(equal = CODE_LENGTH))]
    #[zeroize(skip)]
    code: String,
    #[validate(
        length(
            min = 8,
            max = 255,
            message = "Password must contain at least 8 characters."
        ),
        custom(
            function = "crate::router::validate_password",
            message = "Password is too weak."
        )
    )]
    password: String,
}

/// Store a reset code on the account owning `email`, then mail the code.
///
/// An unknown email is reported as such.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<StatusCode> {
    let mut user = UserBuilder::new()
        .email(&body.email)
        .build(state.db.postgres.clone(), state.crypto.clone())
        .find_by_email()
        .await?;

    let code = user.issue_reset_code().await?;

    state
        .mail
        .publish_event(PasswordReset, &body.email, &user.data, &code)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// Consume an emailed reset code and set the new password.
pub async fn confirm_handler(
    State(state): State<AppState>,
    Valid(body): Valid<ConfirmBody>,
) -> Result<Json<()>> {
    let mut user = UserBuilder::new()
        .id(&body.id)
        .build(state.db.postgres.clone(), state.crypto.clone())
        .find_by_id()
        .await?;

    user.reset_password(&body.code, &body.password).await?;

    Ok(Json(()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::*;

    #[tokio::test]
    async fn test_recover_rejects_invalid_email() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let req_body = Body {
            email: "not-an-email".into(),
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/account/recover",
            json!(req_body).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_confirm_rejects_weak_password() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let req_body = ConfirmBody {
            id: "admin".into(),
            code: "0".repeat(32),
            password: "passwordonly".into(),
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/account/recover/confirm",
            json!(req_body).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_confirm_rejects_truncated_code() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let req_body = ConfirmBody {
            id: "admin".into(),
            code: "deadbeef".into(),
            password: "P$soW%920$n&".into(),
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/account/recover/confirm",
            json!(req_body).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
