use crate::services::metrics::record_action;
use crate::services::{AuthErrorKind, AuthProvider, Credentials, SignIn, SignInError};
use tracing::{info, instrument};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong.";

/// Outcome of a sign-in attempt the login form can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    SignedIn(SignIn),
    /// User-facing message for a recognised provider failure.
    Failed(&'static str),
}

/// Forward the submitted credentials to the provider.
///
/// Recognised failure categories become a message; anything else is
/// returned as an error for the caller to surface.
#[instrument(skip(provider, credentials))]
pub async fn authenticate(
    provider: &dyn AuthProvider,
    strategy: &str,
    credentials: &Credentials,
) -> Result<Authentication, SignInError> {
    match provider.sign_in(strategy, credentials).await {
        Ok(sign_in) => {
            record_action("authenticate", "success");
            info!(user_id = ?sign_in.user_id, "User signed in");
            Ok(Authentication::SignedIn(sign_in))
        }
        Err(SignInError::Auth(kind)) => {
            record_action("authenticate", "rejected");
            let message = match kind {
                AuthErrorKind::CredentialsSignin => INVALID_CREDENTIALS,
                _ => SOMETHING_WENT_WRONG,
            };
            info!(kind = %kind, "Sign-in failed");
            Ok(Authentication::Failed(message))
        }
        Err(err) => Err(err),
    }
}
