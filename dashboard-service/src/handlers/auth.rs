use crate::actions::{authenticate, Authentication, INVOICES_ROUTE};
use crate::services::{Credentials, SignIn};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use service_core::error::AppError;
use tower_sessions::Session;

pub const LOGIN_ROUTE: &str = "/login";
pub const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const USER_ID_KEY: &str = "user_id";

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    let outcome = authenticate(
        state.auth_provider.as_ref(),
        &state.sign_in_strategy,
        &credentials,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Sign-in provider failure");
        AppError::BadGateway(e.to_string())
    })?;

    match outcome {
        Authentication::SignedIn(sign_in) => {
            store_session(&session, &sign_in).await?;
            Ok(Redirect::to(INVOICES_ROUTE).into_response())
        }
        Authentication::Failed(message) => Ok((StatusCode::UNAUTHORIZED, message).into_response()),
    }
}

async fn store_session(session: &Session, sign_in: &SignIn) -> Result<(), AppError> {
    let session_error = |e: tower_sessions::session::Error| {
        tracing::error!("Failed to update session: {}", e);
        AppError::SessionError(e.to_string())
    };

    // New id on privilege change.
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(ACCESS_TOKEN_KEY, &sign_in.access_token)
        .await
        .map_err(session_error)?;
    if let Some(refresh_token) = &sign_in.refresh_token {
        session
            .insert(REFRESH_TOKEN_KEY, refresh_token)
            .await
            .map_err(session_error)?;
    }
    if let Some(user_id) = &sign_in.user_id {
        session
            .insert(USER_ID_KEY, user_id)
            .await
            .map_err(session_error)?;
    }

    Ok(())
}

pub async fn logout_handler(session: Session) -> impl IntoResponse {
    session.clear().await;
    Redirect::to(LOGIN_ROUTE)
}
