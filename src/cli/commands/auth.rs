//! Authentication commands.
//!
//! - `tb login <email>` - Log in and save the session
//! - `tb register <email>` - Create an account and save the session
//! - `tb logout` - Forget the saved session
//! - `tb whoami` - Show the current login

use serde::Serialize;

use super::{block_on, print_json, AppContext};
use crate::cli::{LoginArgs, RegisterArgs};
use crate::config::clear_session;
use crate::error::Result;
use crate::model::Session;

#[derive(Serialize)]
struct SessionOutput<'a> {
    authenticated: bool,
    email: Option<&'a str>,
    api_url: &'a str,
}

fn report(ctx: &AppContext, session: &Session, verb: &str) -> Result<()> {
    if ctx.json {
        return print_json(&SessionOutput {
            authenticated: session.is_authenticated(),
            email: session.email(),
            api_url: &ctx.config.api_url,
        });
    }
    println!("{verb} as {}", session.email().unwrap_or_default());
    Ok(())
}

pub fn execute_login(args: &LoginArgs, api_url: Option<&str>, json: bool) -> Result<()> {
    let ctx = AppContext::load(api_url, json)?;
    let session = block_on(ctx.client.auth().login(&args.email, &args.password))??;
    ctx.persist_session()?;
    report(&ctx, &session, "Logged in")
}

pub fn execute_register(args: &RegisterArgs, api_url: Option<&str>, json: bool) -> Result<()> {
    let ctx = AppContext::load(api_url, json)?;
    let session = block_on(ctx.client.auth().register(
        &args.email,
        &args.password,
        &args.confirm_password,
    ))??;
    ctx.persist_session()?;
    report(&ctx, &session, "Registered and logged in")
}

pub fn execute_logout(api_url: Option<&str>, json: bool) -> Result<()> {
    let ctx = AppContext::load(api_url, json)?;
    ctx.client.auth().logout();
    let removed = clear_session(&ctx.dir)?;

    if json {
        print_json(&serde_json::json!({ "logged_out": true, "session_removed": removed }))
    } else {
        println!("Logged out");
        Ok(())
    }
}

pub fn execute_whoami(api_url: Option<&str>, json: bool) -> Result<()> {
    let ctx = AppContext::load(api_url, json)?;
    let session = ctx.client.session().snapshot();

    if json {
        return print_json(&SessionOutput {
            authenticated: session.is_authenticated(),
            email: session.email(),
            api_url: &ctx.config.api_url,
        });
    }

    match session.email() {
        Some(email) => println!("{email} ({})", ctx.config.api_url),
        None => println!("Not logged in ({})", ctx.config.api_url),
    }
    Ok(())
}
