//! Command implementations.

pub mod auth;
pub mod completions;
pub mod config;
pub mod dashboard;
pub mod project;
pub mod task;
pub mod version;

use std::future::Future;
use std::path::PathBuf;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::api::Client;
use crate::config::{load_config_file, read_session, require_taskboard_dir, resolve_with, write_session, Config};
use crate::error::{Error, Result};
use crate::model::{ProjectStatus, SessionContext, TaskStatus};

/// Everything a backend-facing command needs.
pub struct AppContext {
    pub config: Config,
    pub dir: PathBuf,
    pub client: Client,
    pub json: bool,
}

impl AppContext {
    /// Resolve configuration and load the saved session, if any.
    pub fn load(api_url: Option<&str>, json: bool) -> Result<Self> {
        let dir = require_taskboard_dir()?;
        let file = load_config_file(&dir)?;
        let config = resolve_with(api_url, &file)?;
        let session = read_session(&dir, &config.api_url).unwrap_or_default();
        let client = Client::from_config(&config, SessionContext::with_session(session));

        Ok(Self {
            config,
            dir,
            client,
            json,
        })
    }

    /// Save the client's current session (or remove it when logged out).
    pub fn persist_session(&self) -> Result<()> {
        write_session(
            &self.dir,
            &self.client.session().snapshot(),
            &self.config.api_url,
        )
    }
}

/// Run `fut` to completion on a fresh tokio runtime.
pub fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {e}")))?;
    Ok(rt.block_on(fut))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn paint_project_status(status: ProjectStatus) -> ColoredString {
    match status {
        ProjectStatus::Active => status.as_str().green(),
        ProjectStatus::Completed => status.as_str().dimmed(),
    }
}

pub(crate) fn paint_task_status(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Todo => status.as_str().yellow(),
        TaskStatus::InProgress => status.as_str().cyan(),
        TaskStatus::Done => status.as_str().green(),
    }
}
