//! Update user data.
//!
//! An email change flags the address unverified and re-triggers the
//! verification mail with a fresh code.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::mail::Template::VerifyEmail;
use crate::router::Valid;
use crate::user::UserService;
use crate::{AppState, ServerError};

#[derive(Debug, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(
        min = 2,
        max = 50,
        message = "Name must be 2 to 50 characters long."
    ))]
    username: Option<String>,
    #[validate(length(
        max = 255,
        message = "Biography must be 0 to 255 characters long."
    ))]
    summary: Option<String>,
    #[validate(email(message = "Email must be formatted."))]
    email: Option<String>,
    #[validate(length(
        min = 8,
        message = "Password must contain at least 8 characters."
    ))]
    password: Option<String>,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(mut user): Extension<UserService>,
    Valid(body): Valid<Body>,
) -> Result<Json<()>, ServerError> {
    if let Some(username) = body.username {
        user.data.username = username;
    }

    if let Some(summary) = body.summary {
        user.data.summary = Some(summary);
    }

    let mut changed_email = None;
    if let Some((email, password)) = body.email.clone().zip(body.password) {
        user.authenticate(&password)?;

        user.data.email_hash = state.crypto.hasher.digest(&email);
        user.data.email_cipher =
            state.crypto.symmetric.encrypt_and_hex(&email)?;
        user.data.email_verified = false;
        changed_email = Some(email);
    } else if body.email.is_some() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "password",
            ValidationError::new("pwd")
                .with_message("Missing 'password' field.".into()),
        );
        return Err(ServerError::Validation(errors));
    }

    user.repo.update(&user.data).await?;

    // The new address must be confirmed again.
    if let Some(email) = changed_email {
        let code = user.issue_verification_code().await?;
        state
            .mail
            .publish_event(VerifyEmail, &email, &user.data, &code)
            .await?;
    }

    Ok(Json(()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::*;

    #[tokio::test]
    async fn test_update_requires_authorization() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let req_body = Body {
            username: Some("new_name".into()),
            summary: None,
            email: None,
            password: None,
        };
        let response = make_request(
            None,
            app,
            Method::PATCH,
            "/users/@me",
            json!(req_body).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
