//! Persisted login for the CLI.
//!
//! Each `tb` invocation is a fresh process, so the session a `tb login`
//! obtains is saved to `<taskboard dir>/session.json` and loaded into the
//! [`SessionContext`](crate::model::SessionContext) of later commands. The
//! file records which backend issued the token; it is ignored when the
//! active base URL differs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::Session;

const SESSION_FILE: &str = "session.json";

/// On-disk session record.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub token: String,
    pub email: String,
    pub api_url: String,
    /// Unix milliseconds
    pub saved_at: i64,
}

fn session_path(dir: &Path) -> PathBuf {
    dir.join(SESSION_FILE)
}

/// Load the session saved for `api_url`.
///
/// Returns `None` if:
/// - The file doesn't exist
/// - The file is corrupted
/// - It was issued by a different backend
pub fn read_session(dir: &Path, api_url: &str) -> Option<Session> {
    let path = session_path(dir);
    if !path.exists() {
        return None;
    }

    let content = fs::read_to_string(&path).ok()?;
    let stored: StoredSession = match serde_json::from_str(&content) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupted session file");
            return None;
        }
    };

    if stored.api_url.trim_end_matches('/') != api_url.trim_end_matches('/') {
        debug!(saved_for = %stored.api_url, active = api_url, "saved session belongs to another backend");
        return None;
    }

    Some(Session::authenticated(stored.token, stored.email))
}

/// Persist `session` for `api_url`.
///
/// Writes to a temp file with owner-only permissions, then renames over the
/// final path so a concurrent reader never sees a partial file. A logged-out
/// session removes the file instead.
pub fn write_session(dir: &Path, session: &Session, api_url: &str) -> Result<()> {
    let Some(credentials) = session.credentials() else {
        clear_session(dir)?;
        return Ok(());
    };

    fs::create_dir_all(dir)?;

    let stored = StoredSession {
        token: credentials.token.clone(),
        email: credentials.email.clone(),
        api_url: api_url.to_string(),
        saved_at: chrono::Utc::now().timestamp_millis(),
    };
    let json = serde_json::to_string_pretty(&stored)?;

    let file_path = session_path(dir);
    let temp_path = dir.join(format!("{SESSION_FILE}.tmp"));

    {
        let mut opts = fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        opts.mode(0o600);
        let mut file = opts.open(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
    }
    fs::rename(&temp_path, &file_path)?;

    debug!(path = %file_path.display(), "session saved");
    Ok(())
}

/// Remove the saved session. Returns whether a file was removed.
pub fn clear_session(dir: &Path) -> Result<bool> {
    let path = session_path(dir);
    if path.exists() {
        fs::remove_file(&path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
