//! HTTP transport for the Taskboard backend.
//!
//! Wraps a `reqwest::Client` with the configured base URL and the current
//! session's bearer token, and maps every failure into the crate's error
//! taxonomy.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::SessionContext;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport bound to one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
    timeout: Duration,
}

/// `{ success }` acknowledgement returned by delete endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    /// Read an acknowledgement out of any response body.
    ///
    /// Only an object can carry `success`/`message`; `null`, strings, and
    /// other shapes count as a plain success.
    #[must_use]
    pub fn from_body(body: serde_json::Value) -> Self {
        match body {
            serde_json::Value::Object(_) => serde_json::from_value(body).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Treat an explicit `success: false` as a rejection.
    pub fn check(self, what: &str) -> Result<Self> {
        if self.success == Some(false) {
            return Err(Error::Remote {
                status: StatusCode::OK.as_u16(),
                message: self
                    .message
                    .unwrap_or_else(|| format!("{what} was not acknowledged")),
            });
        }
        Ok(self)
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(Method::PUT, path, Some(body)).await
    }

    /// `DELETE` whose body is only inspected for `success: false`.
    ///
    /// Bodies that are not JSON are treated like an empty body.
    pub async fn delete_ack(&self, path: &str, what: &str) -> Result<Ack> {
        let text = self.send_raw(Method::DELETE, path, None).await?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);
        Ack::from_body(body).check(what)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let text = self.send_raw(method.clone(), path, body).await?;
        let raw = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(raw)
            .map_err(|e| Error::InvalidResponse(format!("{method} {path}: {e}")))
    }

    /// Send a request and return the body of a success response.
    async fn send_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String> {
        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .timeout(self.timeout);

        // A missing token is not an error here; the backend decides.
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{method} {path}: {e}")))?;

        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "response");

        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("{method} {path}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(rejection(status, &text));
        }
        Ok(text)
    }
}

/// Build the error for a non-success response.
///
/// Prefers the JSON body's `message` (or `error`) field, then the raw text,
/// then the status reason.
fn rejection(status: StatusCode, body: &str) -> Error {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(str::to_string))
        });

    let message = from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    let code = status.as_u16();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        Error::Unauthorized {
            status: code,
            message,
        }
    } else {
        Error::Remote {
            status: code,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_prefers_json_message() {
        let err = rejection(StatusCode::BAD_REQUEST, r#"{"message":"User already exists"}"#);
        assert!(
            matches!(err, Error::Remote { status: 400, ref message } if message == "User already exists")
        );
    }

    #[test]
    fn test_rejection_falls_back_to_text_then_reason() {
        let err = rejection(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, Error::Remote { ref message, .. } if message == "upstream down"));

        let err = rejection(StatusCode::NOT_FOUND, "");
        assert!(matches!(err, Error::Remote { status: 404, ref message } if message == "Not Found"));
    }

    #[test]
    fn test_rejection_unauthorized() {
        let err = rejection(StatusCode::UNAUTHORIZED, r#"{"error":"jwt expired"}"#);
        assert!(matches!(err, Error::Unauthorized { status: 401, ref message } if message == "jwt expired"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:9000/api/", SessionContext::new());
        assert_eq!(client.url("/project/projects"), "http://localhost:9000/api/project/projects");
    }

    #[test]
    fn test_ack_from_any_body() {
        assert!(Ack::from_body(serde_json::json!("deleted")).check("delete task").is_ok());
        assert!(Ack::from_body(serde_json::Value::Null).check("delete task").is_ok());
        assert!(Ack::from_body(serde_json::json!([1, 2])).check("delete task").is_ok());
        assert!(Ack::from_body(serde_json::json!({ "success": true })).check("delete task").is_ok());

        let err = Ack::from_body(serde_json::json!({ "success": false, "message": "in use" }))
            .check("delete project")
            .unwrap_err();
        assert!(matches!(err, Error::Remote { ref message, .. } if message == "in use"));
    }

    #[test]
    fn test_ack_false_is_rejection() {
        let ack = Ack {
            success: Some(false),
            message: None,
        };
        assert!(ack.check("delete project").is_err());
        assert!(Ack::default().check("delete project").is_ok());
    }
}
