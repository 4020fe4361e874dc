//! Credential sign-in against the external authentication provider.

use crate::config::AuthProviderConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Submitted credential fields, forwarded to the provider as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Credentials(pub BTreeMap<String, String>);

impl Credentials {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignIn {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Failure categories the provider reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The submitted credentials were rejected.
    CredentialsSignin,
    AccessDenied,
    CallbackRouteError,
    Configuration,
}

impl AuthErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::CredentialsSignin => "CredentialsSignin",
            AuthErrorKind::AccessDenied => "AccessDenied",
            AuthErrorKind::CallbackRouteError => "CallbackRouteError",
            AuthErrorKind::Configuration => "Configuration",
        }
    }

    /// Classify a non-success provider response.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => AuthErrorKind::CredentialsSignin,
            StatusCode::FORBIDDEN => AuthErrorKind::AccessDenied,
            s if s.is_client_error() => AuthErrorKind::CallbackRouteError,
            _ => AuthErrorKind::Configuration,
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SignInError {
    /// A failure the provider recognised and categorised.
    #[error("Authentication error: {0}")]
    Auth(AuthErrorKind),

    /// Anything else: transport failures, malformed responses.
    #[error("Sign-in failed: {0}")]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, strategy: &str, credentials: &Credentials)
        -> Result<SignIn, SignInError>;
}

/// Provider reached over HTTP at `{url}/auth/login`.
pub struct HttpAuthProvider {
    client: Client,
    settings: AuthProviderConfig,
}

impl HttpAuthProvider {
    pub fn new(settings: AuthProviderConfig) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }
}

/// Body key carrying the configured strategy; a form field of that name is dropped.
const STRATEGY_FIELD: &str = "strategy";

#[derive(Serialize)]
struct SignInRequest<'a> {
    strategy: &'a str,
    #[serde(flatten)]
    fields: BTreeMap<&'a str, &'a str>,
}

impl<'a> SignInRequest<'a> {
    fn new(strategy: &'a str, credentials: &'a Credentials) -> Self {
        let fields = credentials
            .0
            .iter()
            .filter(|(field, _)| field.as_str() != STRATEGY_FIELD)
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect();
        Self { strategy, fields }
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn sign_in(
        &self,
        strategy: &str,
        credentials: &Credentials,
    ) -> Result<SignIn, SignInError> {
        let url = format!("{}/auth/login", self.settings.url.trim_end_matches('/'));

        let response = self
            .client
            .traced_post(&url)
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .json(&SignInRequest::new(strategy, credentials))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send sign-in request to {}: {}", url, e);
                anyhow::anyhow!("HTTP request failed: {}", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let kind = AuthErrorKind::from_status(status);
            tracing::warn!(status = %status, kind = %kind, "Sign-in rejected by provider");
            return Err(SignInError::Auth(kind));
        }

        let sign_in = response.json::<SignIn>().await.map_err(|e| {
            tracing::error!("Failed to decode sign-in response: {}", e);
            anyhow::anyhow!("Invalid sign-in response: {}", e)
        })?;

        Ok(sign_in)
    }
}
