//! Authentication client.
//!
//! Exchanges email/password for a session token. All field rules are checked
//! before the request is sent; a failed precondition never reaches the
//! network.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::ApiClient;
use crate::cache::QueryCache;
use crate::error::{Error, Result};
use crate::model::Session;
use crate::validate::{validate_confirmation, validate_email, validate_password};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    confirm_password: &'a str,
}

/// `{ token, ... }`; other fields are ignored.
#[derive(Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
}

pub struct AuthApi<'a> {
    http: &'a ApiClient,
    cache: &'a QueryCache,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(http: &'a ApiClient, cache: &'a QueryCache) -> Self {
        Self { http, cache }
    }

    /// Log in and install the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        validate_email(email)?;
        validate_password(password)?;

        debug!(email, "logging in");
        let response: AuthResponse = self
            .http
            .post("/user/login", &LoginRequest { email, password })
            .await?;
        self.install(email, response)
    }

    /// Register a new account and install the session.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Session> {
        let email = email.trim();
        validate_email(email)?;
        validate_password(password)?;
        validate_confirmation(password, confirm_password)?;

        debug!(email, "registering");
        let response: AuthResponse = self
            .http
            .post(
                "/user/register",
                &RegisterRequest {
                    email,
                    password,
                    confirm_password,
                },
            )
            .await?;
        self.install(email, response)
    }

    /// Forget the session and everything fetched under it.
    pub fn logout(&self) {
        self.http.session().clear();
        self.cache.clear();
        info!("logged out");
    }

    fn install(&self, email: &str, response: AuthResponse) -> Result<Session> {
        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidResponse("authentication response has no token".into()))?;

        let session = Session::authenticated(token, email);
        // Cached data belongs to whoever was logged in before.
        self.cache.clear();
        self.http.session().install(session.clone());
        info!(email, "session installed");
        Ok(session)
    }
}
