//! Configuration commands.
//!
//! - `tb config show` - Print the resolved configuration and where it came from
//! - `tb config set --url <url> --timeout <secs>` - Save values to `config.json`

use colored::Colorize;
use serde::Serialize;

use super::print_json;
use crate::cli::ConfigCommands;
use crate::config::{
    load_config_file, read_session, require_taskboard_dir, resolve_with, save_config_file, Config,
    ConfigFile, UrlSource,
};
use crate::error::{Error, Result};

#[derive(Serialize)]
struct ConfigOutput<'a> {
    #[serde(flatten)]
    config: &'a Config,
    config_dir: String,
    logged_in_as: Option<String>,
}

pub fn execute(command: &ConfigCommands, api_url: Option<&str>, json: bool) -> Result<()> {
    match command {
        ConfigCommands::Show => execute_show(api_url, json),
        ConfigCommands::Set { url, timeout } => execute_set(url.as_deref(), *timeout, json),
    }
}

fn execute_show(api_url: Option<&str>, json: bool) -> Result<()> {
    let dir = require_taskboard_dir()?;
    let config = resolve_with(api_url, &load_config_file(&dir)?)?;
    let logged_in_as = read_session(&dir, &config.api_url)
        .and_then(|s| s.email().map(String::from));

    if json {
        return print_json(&ConfigOutput {
            config: &config,
            config_dir: dir.display().to_string(),
            logged_in_as,
        });
    }

    let source = match config.api_url_source {
        UrlSource::Override => "flag/TB_API_URL",
        UrlSource::File => "config.json",
        UrlSource::Default => "default",
    };
    println!("API URL:    {} {}", config.api_url, format!("({source})").dimmed());
    println!("Timeout:    {}s", config.timeout_secs);
    println!("Config dir: {}", dir.display());
    println!(
        "Session:    {}",
        logged_in_as.as_deref().unwrap_or("not logged in")
    );
    Ok(())
}

fn execute_set(url: Option<&str>, timeout: Option<u64>, json: bool) -> Result<()> {
    if url.is_none() && timeout.is_none() {
        return Err(Error::InvalidArgument(
            "nothing to set: pass --url and/or --timeout".into(),
        ));
    }
    if timeout == Some(0) {
        return Err(Error::validation("timeout", "must be at least 1 second"));
    }

    let dir = require_taskboard_dir()?;
    let saved = save_config_file(
        &dir,
        &ConfigFile {
            api_url: url.map(|u| u.trim().trim_end_matches('/').to_string()),
            timeout_secs: timeout,
        },
    )?;

    if json {
        return print_json(&saved);
    }

    println!("Saved {}", dir.join("config.json").display());
    if let Some(url) = &saved.api_url {
        println!("  API URL: {url}");
    }
    if let Some(secs) = saved.timeout_secs {
        println!("  Timeout: {secs}s");
    }
    Ok(())
}
