//! cgen - Git commit message generator backed by Azure OpenAI
//!
//! This library sends a unified diff to an Azure OpenAI chat-completions
//! deployment and returns the generated commit message.
//!
//! # Modules
//!
//! - [`message`] - Chat message and conversation types
//! - [`config`] - URL derivation, auth selection and system prompt
//! - [`auth`] - API-key and bearer-token request decoration
//! - [`client`] - HTTP round trip to the completion endpoint
//! - [`error`] - Error taxonomy shared by all modules
//!
//! # Example
//!
//! ```no_run
//! use cgen::{client::OpenAiClient, config::{Config, ConfigOptions}};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let options = ConfigOptions {
//!     api_key: Some("key".to_string()),
//!     ..Default::default()
//! };
//! let config = Config::new("https://example.openai.azure.com", "gpt-4", options)?;
//! let message = OpenAiClient::new(config)
//!     .get_commit_message("diff --git a/x b/x\n+foo\n")
//!     .await?;
//! println!("Generated message: {}", message);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
