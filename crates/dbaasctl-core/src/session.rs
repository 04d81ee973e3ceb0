//! Operator credentials and the authenticated session
//!
//! A [`Session`] is created once per run by [`authorize`] and never refreshed.

use reqwest::StatusCode;
use std::fmt;
use tracing::info;

use crate::client::DbaasClient;
use crate::error::{CoreError, Result};
use crate::models::{AuthRequest, AuthResponse};
use crate::step::Step;

/// Control-plane endpoint plus operator identity
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    base_url: String,
    login: String,
    password: String,
}

impl Credentials {
    pub fn new(
        base_url: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            login: login.into(),
            password: password.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Fail before any remote call when the identity is incomplete
    pub fn ensure_complete(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.login.is_empty() {
            missing.push("API_LOGIN");
        }
        if self.password.is_empty() {
            missing.push("API_PASSWORD");
        }
        if self.base_url.is_empty() {
            missing.push("API_BASE_URL");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingCredentials(format!(
                "{} not set or empty",
                missing.join(", ")
            )))
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated session owned by a single run
#[derive(Clone)]
pub struct Session {
    credentials: Credentials,
    token: String,
    client: DbaasClient,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credentials", &self.credentials)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Session {
    /// Build a session from an already issued token
    pub fn from_token(client: &DbaasClient, credentials: Credentials, token: String) -> Self {
        Self {
            client: client.with_token(token.clone()),
            credentials,
            token,
        }
    }

    /// Client that sends the session's bearer token
    pub fn client(&self) -> &DbaasClient {
        &self.client
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Step 1: exchange operator credentials for a bearer token
///
/// Empty login or password is rejected without issuing a request. Requires HTTP
/// 200 and a non-empty `refresh_token`.
pub async fn authorize(client: &DbaasClient, credentials: &Credentials) -> Result<Session> {
    credentials.ensure_complete()?;

    let step = Step::Authenticate;
    let request = AuthRequest {
        login: credentials.login(),
        password: credentials.password(),
    };
    let auth: AuthResponse = client
        .post(step, "/api/authorize", &request)
        .await?
        .expect_status(step, StatusCode::OK)?
        .json(step)?;

    if auth.refresh_token.is_empty() {
        return Err(CoreError::EmptyToken);
    }

    info!("Authorization successful for '{}'", credentials.login());
    Ok(Session::from_token(
        client,
        credentials.clone(),
        auth.refresh_token,
    ))
}
