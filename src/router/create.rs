use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::mail::Template::VerifyEmail;
use crate::router::Valid;
use crate::user::UserBuilder;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        length(min = 2, max = 15),
        custom(
            function = "crate::router::validate_id",
            message = "Vanity must be alphanumeric."
        )
    )]
    pub id: String,
    #[validate(email(message = "Email must be formatted."))]
    email: String,
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
    #[validate(length(
        equal = 2,
        message = "Locale must be ISO 3166-1 alpha-2."
    ))]
    locale: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub expires_in: u64,
}

/// Handler to create user.
///
/// New accounts start unverified and receive a verification mail.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let mut user = UserBuilder::new()
        .id(body.id.to_lowercase())
        .email(&body.email)
        .username(&body.id)
        .password(&body.password)
        .locale(body.locale)
        .build(state.db.postgres.clone(), state.crypto.clone())
        .create_user()
        .await?;

    let code = user.issue_verification_code().await?;
    state
        .mail
        .publish_event(VerifyEmail, &body.email, &user.data, &code)
        .await?;

    let token = state.token.create(&user.data.id)?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            token_type: TOKEN_TYPE.to_owned(),
            token,
            expires_in: crate::token::EXPIRATION_TIME,
        }),
    ))
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::*;

    #[tokio::test]
    async fn test_create_with_weak_password() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let req_body = router::create::Body {
            id: "user2".into(),
            email: "test2@example.com".into(),
            password: "passwordonly".into(),
            locale: None,
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/create",
            json!(req_body).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_with_invalid_email() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let req_body = router::create::Body {
            id: "user3".into(),
            email: "not-an-email".into(),
            password: "P$soW%920$n&".into(),
            locale: None,
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/create",
            json!(req_body).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_with_invalid_vanity() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let req_body = router::create::Body {
            id: "not a vanity".into(),
            email: "test4@example.com".into(),
            password: "P$soW%920$n&".into(),
            locale: None,
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/create",
            json!(req_body).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
