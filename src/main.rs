//! CLI tool to generate git commit messages with Azure OpenAI
//!
//! Reads a diff from standard input and prints the generated commit
//! message to standard output. All settings come from the environment.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::warn;

use cgen::{
    auth::{Credential, DEFAULT_AUTHORITY_HOST},
    client::OpenAiClient,
    config::{Config, ConfigOptions, load_prompt_file},
    error::CgenError,
};

/// How requests are authenticated
#[derive(Clone, Copy, Debug, ValueEnum)]
enum AuthMode {
    /// Static key from OPENAI_API_KEY
    ApiKey,
    /// Azure identity token (client secret from AZURE_* variables, else Azure CLI)
    Azure,
}

/// Settings, each bound to an environment variable
///
/// Required values are optional here and checked in [`Args::required`], so
/// that a missing or empty variable is reported by its name.
#[derive(Parser)]
#[command(name = "cgen", version)]
#[command(about = "Generate a git commit message from a diff on stdin", long_about = None)]
struct Args {
    #[arg(long, env = "OPENAI_ENDPOINT")]
    endpoint: Option<String>,

    #[arg(long, env = "OPENAI_DEPLOYMENT_NAME")]
    deployment_name: Option<String>,

    #[arg(long, env = "CGEN_AUTH", value_enum, default_value = "api-key")]
    auth: AuthMode,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "AZURE_TENANT_ID")]
    tenant_id: Option<String>,

    #[arg(long, env = "AZURE_CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    #[arg(long, env = "AZURE_AUTHORITY_HOST", default_value = DEFAULT_AUTHORITY_HOST)]
    authority_host: String,

    /// TOML file with a `prompt` field replacing the built-in instruction
    #[arg(long, env = "CGEN_PROMPT_FILE")]
    prompt_file: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "CGEN_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

impl Args {
    /// Return a required value, treating empty as unset
    fn required(value: Option<&str>, name: &'static str) -> Result<String, CgenError> {
        value
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(CgenError::MissingEnv(name))
    }

    fn config_options(&self) -> Result<ConfigOptions, CgenError> {
        let system_prompt = self
            .prompt_file
            .as_deref()
            .map(load_prompt_file)
            .transpose()?;

        let mut options = ConfigOptions {
            system_prompt,
            ..Default::default()
        };

        match self.auth {
            AuthMode::ApiKey => {
                let key = Self::required(self.api_key.as_deref(), "OPENAI_API_KEY")?;
                options.api_key = Some(key);
            }
            AuthMode::Azure => {
                options.credential = Some(select_credential(
                    self.tenant_id.as_deref(),
                    self.client_id.as_deref(),
                    self.client_secret.as_deref(),
                    &self.authority_host,
                ));
            }
        }

        Ok(options)
    }
}

/// Pick the Azure credential the way the default credential chain does
///
/// All three client-secret values select [`Credential::ClientSecret`];
/// anything less falls back to the Azure CLI, with a warning when only
/// some of them are set.
fn select_credential(
    tenant_id: Option<&str>,
    client_id: Option<&str>,
    client_secret: Option<&str>,
    authority_host: &str,
) -> Credential {
    fn present(v: Option<&str>) -> Option<&str> {
        v.filter(|v| !v.is_empty())
    }

    match (present(tenant_id), present(client_id), present(client_secret)) {
        (Some(tenant_id), Some(client_id), Some(client_secret)) => Credential::ClientSecret {
            authority_host: authority_host.to_string(),
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        },
        (None, None, None) => Credential::AzureCli,
        (tenant_id, client_id, client_secret) => {
            warn!(
                tenant_id_set = tenant_id.is_some(),
                client_id_set = client_id.is_some(),
                client_secret_set = client_secret.is_some(),
                "Incomplete AZURE_TENANT_ID/AZURE_CLIENT_ID/AZURE_CLIENT_SECRET, falling back to Azure CLI"
            );
            Credential::AzureCli
        }
    }
}

/// Decode raw stdin, replacing invalid UTF-8 with U+FFFD
fn decode_diff(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Main entry point
///
/// # Process flow
///
/// 1. Resolve settings from the environment
/// 2. Build configuration and client
/// 3. Read the diff from stdin
/// 4. Request the commit message and print it
///
/// # Errors
///
/// * A required environment variable is unset or empty
/// * Authentication, transport, HTTP status or response parsing fails
#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the commit message
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let endpoint = Args::required(args.endpoint.as_deref(), "OPENAI_ENDPOINT")?;
    let deployment_name =
        Args::required(args.deployment_name.as_deref(), "OPENAI_DEPLOYMENT_NAME")?;

    let config = Config::new(&endpoint, &deployment_name, args.config_options()?)?;
    let client = OpenAiClient::new(config).with_timeout(Duration::from_secs(args.timeout_secs));

    let mut input = Vec::new();
    tokio::io::stdin().read_to_end(&mut input).await?;
    let diff = decode_diff(&input);

    let message = client.get_commit_message(&diff).await?;
    println!("{}", message);

    Ok(())
}
