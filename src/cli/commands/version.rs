//! `tb version`

use crate::config::DEFAULT_API_URL;
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    name: &'a str,
    version: &'a str,
    build: &'a str,
    default_api_url: &'a str,
}

/// Print the package version and build profile.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        build: if cfg!(debug_assertions) { "dev" } else { "release" },
        default_api_url: DEFAULT_API_URL,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("tb {} ({})", output.version, output.build);
    }
    Ok(())
}
