use crate::handlers::auth::{ACCESS_TOKEN_KEY, LOGIN_ROUTE};
use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Send visitors without a signed-in session to the login page.
pub async fn auth_middleware(session: Session, request: Request<Body>, next: Next) -> Response {
    let access_token: Option<String> = session.get(ACCESS_TOKEN_KEY).await.unwrap_or(None);

    if access_token.is_none() {
        tracing::debug!(path = %request.uri().path(), "Unauthenticated request redirected");
        return Redirect::to(LOGIN_ROUTE).into_response();
    }

    next.run(request).await
}
