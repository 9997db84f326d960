//! Users-related HTTP API.
mod get;
mod update;

use axum::extract::{Path, Request, State};
use axum::http::header;
use axum::response::Response;
use axum::routing::{get, patch};
use axum::{Router, middleware};

use crate::user::UserBuilder;
use crate::{AppState, ServerError};

const BEARER: &str = "Bearer ";
const ME_ROUTE: &str = "@me";

/// Custom middleware for authentification.
///
/// `@me` (or the absence of a path id) resolves through the bearer token;
/// an explicit id resolves without one.
pub(crate) async fn auth(
    State(state): State<AppState>,
    user_id: Option<Path<String>>,
    mut req: Request,
    next: middleware::Next,
) -> Result<Response, ServerError> {
    let user_id = match user_id {
        Some(user_id) => user_id.to_string(),
        None => ME_ROUTE.to_string(),
    };
    let user_id = if user_id == ME_ROUTE {
        match req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
        {
            Some(token) => {
                let token = token.replace(BEARER, "");
                match state.token.decode(&token) {
                    Ok(claims) => claims.sub,
                    Err(_) => return Err(ServerError::Unauthorized),
                }
            },
            None => return Err(ServerError::Unauthorized),
        }
    } else {
        user_id
    };

    let user = UserBuilder::new()
        .id(&user_id)
        .build(state.db.postgres.clone(), state.crypto.clone())
        .find_by_id()
        .await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /users/:ID` goes to `get`.
        .route("/{user_id}", get(get::handler))
        .route("/@me", get(get::handler))
        // `PATCH /users/@me` goes to `update`. Authorization required.
        .route("/@me", patch(update::handler))
        .route_layer(middleware::from_fn_with_state(state, auth))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::*;

    #[tokio::test]
    async fn test_me_requires_authorization() {
        let state = router::tests::lazy_state();
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::GET,
            "/users/@me",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
