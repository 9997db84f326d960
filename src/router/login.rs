use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::router::create::{Response, TOKEN_TYPE};
use crate::user::UserBuilder;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    email: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    password: String,
}

/// Handler to log a user in with email and password.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let user = UserBuilder::new()
        .email(&body.email)
        .build(state.db.postgres.clone(), state.crypto.clone())
        .find_by_email()
        .await?;

    user.authenticate(&body.password)?;

    let token = state.token.create(&user.data.id)?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        token,
        expires_in: crate::token::EXPIRATION_TIME,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::*;

    #[tokio::test]
    async fn test_login_rejects_short_password() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let req_body = Body {
            email: "test@example.com".into(),
            password: "short".into(),
        };
        let response = make_request(
            None,
            app,
            Method::POST,
            "/login",
            json!(req_body).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
