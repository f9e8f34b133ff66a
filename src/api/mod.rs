//! Backend client.
//!
//! [`Client`] owns the transport, the query cache, and the session handle,
//! and hands out borrowed resource clients:
//!
//! ```no_run
//! # async fn demo() -> tb::Result<()> {
//! use tb::api::Client;
//! use tb::model::{ProjectDraft, SessionContext};
//!
//! let client = Client::new("http://localhost:9000/api", SessionContext::new());
//! client.auth().login("dev@example.com", "secret1").await?;
//! client.projects().create(ProjectDraft::titled("Launch")).await?;
//! let projects = client.projects().list().await?;
//! # Ok(()) }
//! ```

pub mod auth;
pub mod http;
pub mod projects;
pub mod tasks;

pub use auth::AuthApi;
pub use http::ApiClient;
pub use projects::ProjectApi;
pub use tasks::TaskApi;

use crate::cache::QueryCache;
use crate::config::Config;
use crate::model::SessionContext;

#[derive(Debug, Clone)]
pub struct Client {
    http: ApiClient,
    cache: QueryCache,
}

impl Client {
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        Self {
            http: ApiClient::new(base_url, session),
            cache: QueryCache::new(),
        }
    }

    /// Client for the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config, session: SessionContext) -> Self {
        Self {
            http: ApiClient::new(config.api_url.clone(), session).with_timeout(config.timeout()),
            cache: QueryCache::new(),
        }
    }

    #[must_use]
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.http, &self.cache)
    }

    #[must_use]
    pub fn projects(&self) -> ProjectApi<'_> {
        ProjectApi::new(&self.http, &self.cache)
    }

    #[must_use]
    pub fn tasks(&self) -> TaskApi<'_> {
        TaskApi::new(&self.http, &self.cache)
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        self.http.session()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }
}
