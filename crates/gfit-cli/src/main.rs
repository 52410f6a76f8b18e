//! Command-line explorer for the Fit v1 API.
//!
//! `gfit ops` lists the registered operations; `gfit call <operation>`
//! invokes one with `-p key=value` parameters and an optional `--resource`
//! JSON body, printing the response as pretty JSON.

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use gfit::transport::{AuthConfig, ReqwestTransport};
use gfit::{Fitness, resolver, v1};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gfit", version, about = "Call Google Fit v1 API operations")]
struct Cli {
    /// OAuth2 access token, sent as a bearer token.
    #[arg(long, env = "GFIT_TOKEN", global = true)]
    token: Option<String>,

    /// API root override (tests, mirrors).
    #[arg(long, env = "GFIT_BASE_URL", default_value = v1::BASE_URL, global = true)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered operations.
    Ops,
    /// Invoke one operation by id.
    Call {
        /// Operation id, e.g. `fitness.users.dataSources.list`.
        operation: String,

        /// Parameter as KEY=VALUE; the value is parsed as JSON, falling back
        /// to a plain string. Repeatable.
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// JSON request body (the reserved `resource` parameter).
        #[arg(long, value_name = "JSON")]
        resource: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let auth = match &cli.token {
        Some(token) => AuthConfig::Bearer {
            token: token.clone(),
        },
        None => AuthConfig::None,
    };
    let fitness = Fitness::with_base_url(ReqwestTransport::new(auth), &cli.base_url)?;

    match cli.command {
        Command::Ops => {
            for descriptor in fitness.registry().descriptors() {
                println!(
                    "{:<7} {:<45} {}",
                    descriptor.method.as_str(),
                    descriptor.id,
                    descriptor.path
                );
            }
        }
        Command::Call {
            operation,
            params,
            resource,
        } => {
            let mut bag = serde_json::Map::new();
            for pair in &params {
                let (key, value) = parse_param(pair)?;
                bag.insert(key, value);
            }
            if let Some(resource) = resource {
                let body: Value =
                    serde_json::from_str(&resource).context("--resource must be valid JSON")?;
                bag.insert(resolver::RESOURCE_PARAM.to_string(), body);
            }

            let response = fitness.call(&operation, Value::Object(bag)).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn parse_param(pair: &str) -> anyhow::Result<(String, Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("invalid parameter '{pair}': expected KEY=VALUE");
    };
    if key.is_empty() {
        bail!("invalid parameter '{pair}': empty key");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
