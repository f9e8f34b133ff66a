//! Taskboard CLI entry point.

use clap::Parser;
use std::process::ExitCode;
use tb::cli::commands;
use tb::cli::{Cli, Commands};
use tb::error::Error;

/// Accept `--title "foo"` where `create` takes the title positionally.
///
/// `update` keeps `--title` as a real flag, so the rewrite only happens
/// for `project create` and `task create`.
fn preprocess_args(args: impl Iterator<Item = String>) -> Vec<String> {
    const POSITIONAL_ALIASES: &[&str] = &["--title"];

    let args: Vec<String> = args.collect();
    let is_create = args
        .windows(2)
        .any(|w| matches!(w[0].as_str(), "project" | "task") && w[1] == "create");
    if !is_create {
        return args;
    }

    let mut result = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        if POSITIONAL_ALIASES.contains(&arg.as_str()) {
            if let Some(value) = iter.next() {
                result.push(value);
            }
        } else if let Some(flag) = POSITIONAL_ALIASES
            .iter()
            .find(|f| arg.starts_with(&format!("{f}=")))
        {
            result.push(arg[flag.len() + 1..].to_string());
        } else {
            result.push(arg);
        }
    }

    result
}

fn main() -> ExitCode {
    let args = preprocess_args(std::env::args());
    let cli = Cli::parse_from(args);

    init_tracing(cli.verbose, cli.quiet);

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    // Effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,reqwest=info,hyper=info,hyper_util=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let api_url = cli.api_url.as_deref();

    match &cli.command {
        Commands::Version => commands::version::execute(json),
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Config { command } => commands::config::execute(command, api_url, json),

        // Auth
        Commands::Login(args) => commands::auth::execute_login(args, api_url, json),
        Commands::Register(args) => commands::auth::execute_register(args, api_url, json),
        Commands::Logout => commands::auth::execute_logout(api_url, json),
        Commands::Whoami => commands::auth::execute_whoami(api_url, json),

        // Resources
        Commands::Project { command } => commands::project::execute(command, api_url, json),
        Commands::Task { command } => commands::task::execute(command, api_url, json),
        Commands::Dashboard(args) => commands::dashboard::execute(args, api_url, json),
    }
}
