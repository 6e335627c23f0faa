//! Configuration for calling the Azure OpenAI chat-completions API
//!
//! This module derives the request URL from an endpoint and deployment name,
//! holds the chosen authentication strategy, and owns the system instruction
//! that steers the model toward commit-message style. It performs no
//! environment reads; callers pass already-resolved values.

use serde::Deserialize;
use std::fs;
use tracing::debug;

use crate::auth::{Auth, Credential};
use crate::error::{CgenError, Result};
use crate::message::Message;

/// API version appended to every request URL
pub const API_VERSION: &str = "2023-03-15";

/// Default system instruction sent ahead of the diff
pub const DEFAULT_SYSTEM_PROMPT: &str = "You generate Git commit messages based on provided output from git diff commands. \
Keep the replies short and to the point. Do not include any explanation, only the commit message. \
Start with a title line of at most 50 characters, followed by a blank line and a body wrapped at 72 characters.";

/// Build the chat-completions URL for a deployment
///
/// No validation is performed on either part; a malformed endpoint yields a
/// malformed URL that fails when the request is sent.
///
/// # Example
///
/// ```
/// use cgen::config::create_url;
///
/// let url = create_url("https://example.openai.azure.com", "gpt-4");
/// assert_eq!(
///     url,
///     "https://example.openai.azure.com/openai/deployments/gpt-4/chat/completions?api-version=2023-03-15"
/// );
/// ```
pub fn create_url(endpoint: &str, deployment_name: &str) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        endpoint, deployment_name, API_VERSION
    )
}

/// Named options applied by [`Config::new`]
///
/// Exactly one of `api_key` or `credential` must be set. An empty API key
/// counts as unset.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub api_key: Option<String>,
    pub credential: Option<Credential>,
    /// Replaces [`DEFAULT_SYSTEM_PROMPT`] when set
    pub system_prompt: Option<String>,
}

/// Resolved configuration, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub auth: Auth,
    pub system_context: Message,
}

impl Config {
    /// Create a configuration, enforcing that exactly one auth method is set
    ///
    /// # Errors
    ///
    /// * Neither an API key nor a credential is provided
    /// * Both an API key and a credential are provided
    pub fn new(endpoint: &str, deployment_name: &str, options: ConfigOptions) -> Result<Self> {
        let api_key = options.api_key.filter(|key| !key.is_empty());

        let auth = match (api_key, options.credential) {
            (Some(key), None) => Auth::ApiKey(key),
            (None, Some(credential)) => Auth::Bearer(credential),
            (None, None) => {
                return Err(CgenError::Config(
                    "no authentication method provided, please provide an API key or Azure credential"
                        .to_string(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(CgenError::Config(
                    "both an API key and an Azure credential were provided, choose one".to_string(),
                ));
            }
        };

        let url = create_url(endpoint, deployment_name);
        debug!(url = %url, auth = auth.kind(), "Resolved configuration");

        let prompt = options
            .system_prompt
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        Ok(Self {
            url,
            auth,
            system_context: Message::system(prompt),
        })
    }
}

/// Prompt override file structure
///
/// # Example TOML
///
/// ```toml
/// prompt = """
/// Write a conventional commit message for the following diff.
/// """
/// ```
#[derive(Deserialize)]
pub struct PromptFile {
    pub prompt: String,
}

/// Load a system instruction override from a TOML file
///
/// # Errors
///
/// * File does not exist or cannot be read
/// * Invalid TOML or missing `prompt` field
/// * Prompt is empty or whitespace-only
pub fn load_prompt_file(path: &str) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|source| CgenError::PromptFileRead {
        path: path.to_string(),
        source,
    })?;
    let file: PromptFile =
        toml::from_str(&content).map_err(|source| CgenError::PromptFileParse {
            path: path.to_string(),
            source,
        })?;

    if file.prompt.trim().is_empty() {
        return Err(CgenError::Config(format!(
            "'prompt' field cannot be empty or whitespace-only in {}",
            path
        )));
    }

    Ok(file.prompt)
}
