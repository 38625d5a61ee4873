//! Operator CLI for the Google Workspace provider
//!
//! Usage:
//!   gworkspace-provider explain --code 403 --message "Quota exceeded for quota metric"
//!   gworkspace-provider config --file ./googleworkspace.toml

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use gworkspace_provider::config::ConfigLoader;
use gworkspace_retry::{Fault, RetryClassifier};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gworkspace-provider",
    version,
    about = "Inspect the Google Workspace provider's retry and configuration behaviour"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show whether a failed API call would be retried, and why
    Explain(ExplainArgs),

    /// Load, validate and print the effective configuration
    Config {
        /// Config file to load instead of the default locations
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
struct ExplainArgs {
    /// HTTP status code returned by the API
    #[arg(long, conflicts_with = "network")]
    code: Option<u16>,

    /// Raw response body
    #[arg(long, requires = "code")]
    body: Option<String>,

    /// Error message (API error message, or text of a non-API error)
    #[arg(long)]
    message: Option<String>,

    /// Treat the failure as a network-layer error
    #[arg(long)]
    network: bool,

    /// Network error is flagged temporary
    #[arg(long, requires = "network")]
    temporary: bool,

    /// Network error is flagged as a timeout
    #[arg(long, requires = "network")]
    timeout: bool,

    /// Response stream ended with an unexpected EOF
    #[arg(long, conflicts_with_all = ["code", "network"])]
    eof: bool,
}

fn fault_from_args(args: &ExplainArgs) -> Result<Fault> {
    if let Some(code) = args.code {
        let body = match (&args.body, &args.message) {
            (Some(body), _) => body.clone(),
            (None, Some(message)) => {
                json!({"error": {"code": code, "message": message}}).to_string()
            }
            (None, None) => String::new(),
        };
        return Ok(Fault::api(code, body));
    }
    if args.network {
        let message = args.message.as_deref().unwrap_or("network error");
        return Ok(Fault::network(message, args.temporary, args.timeout));
    }
    if args.eof {
        return Ok(Fault::unexpected_eof(None));
    }
    match &args.message {
        Some(message) => Ok(Fault::generic(message.as_str())),
        None => bail!("nothing to explain: pass --code, --network, --eof or --message"),
    }
}

fn explain(args: &ExplainArgs) -> Result<String> {
    let fault = fault_from_args(args)?;
    let classifier = RetryClassifier::default();
    let decision = classifier.classify(&fault);
    let predicate = classifier
        .predicates()
        .iter()
        .find(|p| p.evaluate(&fault).should_retry)
        .map(|p| p.name());

    let mut out = format!("fault:     {fault}\n");
    if decision.should_retry {
        out.push_str(&format!("retry:     yes ({})\n", decision.reason));
        out.push_str(&format!("predicate: {}\n", predicate.unwrap_or("-")));
        match decision.delay {
            Some(delay) => out.push_str(&format!("delay:     {delay:?} before the next attempt\n")),
            None => out.push_str("delay:     exponential backoff\n"),
        }
    } else {
        out.push_str("retry:     no\n");
    }
    Ok(out)
}

fn show_config(file: Option<PathBuf>) -> Result<String> {
    let config = match file {
        Some(path) => ConfigLoader::new()
            .with_file(&path)
            .load()
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ConfigLoader::load_default().context("loading configuration")?,
    };
    config
        .redacted()
        .to_toml()
        .context("formatting configuration as TOML")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Command::Explain(args) => explain(&args)?,
        Command::Config { file } => show_config(file)?,
    };

    #[allow(clippy::print_stdout)]
    {
        print!("{output}");
    }
    Ok(())
}
