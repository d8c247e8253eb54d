//! CLI entry point for fortisase, issuing one raw operation against the
//! FortiSASE management API.
//!
//! Authenticates with a password grant (or a pre-issued access token), then
//! runs the selected subcommand against a path template and prints the
//! result as JSON.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (auth failure, API error, connection lost, etc.)
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use fortisase::client::FortiSaseClient;
use fortisase::config::ClientConfig;
use fortisase::credentials::Credentials;
use fortisase::request::OperationRequest;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    login: LoginArgs,

    /// Override the resource API host (scheme and host, no path).
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Login material. A token alone is enough; otherwise both username and
/// password are needed, which is checked at runtime.
#[derive(clap::Args)]
#[group(required = true, multiple = true)]
struct LoginArgs {
    /// API user name for the password grant.
    #[arg(long)]
    username: Option<String>,

    /// API user password for the password grant.
    #[arg(long)]
    password: Option<String>,

    /// Pre-issued access token; skips the password grant.
    #[arg(long)]
    access_token: Option<String>,
}

/// Path template and the values that fill it.
#[derive(clap::Args)]
struct Target {
    /// Path template, e.g. `/resource-api/v1/security/antivirus-profiles/{primaryKey}`.
    template: String,

    /// Primary key for a single-placeholder template.
    #[arg(long)]
    key: Option<String>,

    /// Named path parameter as `name=value`. Repeatable.
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Command {
    /// Read a resource (GET).
    Get {
        #[command(flatten)]
        target: Target,
    },
    /// Create a resource (POST).
    Create {
        #[command(flatten)]
        target: Target,
        /// JSON object body.
        #[arg(long)]
        body: String,
    },
    /// Update a resource (PUT).
    Update {
        #[command(flatten)]
        target: Target,
        /// JSON object body.
        #[arg(long)]
        body: String,
    },
    /// Delete a resource (DELETE).
    Delete {
        #[command(flatten)]
        target: Target,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

impl LoginArgs {
    fn credentials(&self) -> Option<Credentials> {
        if let Some(token) = &self.access_token {
            return Some(Credentials::with_tokens(token, ""));
        }
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(Credentials::new(user, pass)),
            _ => None,
        }
    }
}

impl Target {
    fn operation(&self, method: Method) -> OperationRequest {
        let mut op = OperationRequest::new(method, &self.template);
        if let Some(key) = &self.key {
            op = op.primary_key(key.as_str());
        }
        for (name, value) in &self.params {
            op = op.path_param(name, value.as_str());
        }
        op
    }
}

fn parse_body(raw: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("--body must be a JSON object".to_string()),
        Err(e) => Err(format!("--body is not valid JSON: {e}")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let Some(credentials) = args.login.credentials() else {
        eprintln!("Error: --username and --password are required unless --access-token is given");
        return ExitCode::FAILURE;
    };

    let mut config = ClientConfig::default();
    if let Some(url) = &args.base_url {
        config = config.with_api_base_url(url);
    }

    let client = match FortiSaseClient::with_config(credentials, config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match &args.command {
        Command::Get { target } => client
            .read(&target.operation(Method::GET))
            .await
            .map(|found| found.unwrap_or(Value::Null)),
        Command::Create { target, body } | Command::Update { target, body } => {
            let method = if matches!(args.command, Command::Create { .. }) {
                Method::POST
            } else {
                Method::PUT
            };
            // clap only sees a string; the object check happens here.
            let body = match parse_body(body) {
                Ok(body) => body,
                Err(msg) => {
                    eprintln!("Error: {msg}");
                    return ExitCode::FAILURE;
                }
            };
            client
                .create_update(&target.operation(method).body(body))
                .await
        }
        Command::Delete { target } => client
            .delete(&target.operation(Method::DELETE))
            .await
            .map(|()| Value::Null),
    };

    match result {
        Ok(Value::Null) if matches!(args.command, Command::Delete { .. }) => {}
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
