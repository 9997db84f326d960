//! Email verification and password recovery HTTP API.
mod recover;
mod verify;

use axum::routing::post;
use axum::{Router, middleware};

use crate::AppState;
use crate::router::users::auth;

pub fn router(state: AppState) -> Router<AppState> {
    let authed = Router::new()
        // `POST /account/verify/send` re-sends the verification mail.
        .route("/verify/send", post(verify::send_handler))
        // `POST /account/verify` consumes the emailed code.
        .route("/verify", post(verify::handler))
        .route_layer(middleware::from_fn_with_state(state, auth));

    Router::new()
        // `POST /account/recover` mails a password reset code.
        .route("/recover", post(recover::handler))
        // `POST /account/recover/confirm` consumes it and sets the password.
        .route("/recover/confirm", post(recover::confirm_handler))
        .merge(authed)
}
