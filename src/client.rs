//! Azure OpenAI integration for commit message generation
//!
//! This module sends a diff to a chat-completions deployment and extracts
//! the generated commit message from the first returned choice.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{CgenError, Result};
use crate::message::{Conversation, Message};

/// Default deadline for a single round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat-completions request body
#[derive(Serialize, Debug)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
}

/// One completion candidate
#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: Message,
}

/// Chat-completions response body
#[derive(Deserialize, Debug)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

/// Client bound to one deployment and one authentication strategy
pub struct OpenAiClient {
    config: Config,
    http: Client,
    timeout: Duration,
}

impl OpenAiClient {
    /// Create a client for `config` with the default 30 second deadline
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved URL, auth strategy and system message
    ///
    /// # Returns
    ///
    /// * `OpenAiClient` - Client ready for [`OpenAiClient::get_commit_message`]
    pub fn new(config: Config) -> Self {
        debug!(auth = config.auth.kind(), "Creating OpenAI client");
        Self {
            config,
            http: Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the request deadline (default 30 seconds)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generate a commit message for `diff`
    ///
    /// The diff is sent verbatim as the user message, after the configured
    /// system message. Nothing is retried.
    ///
    /// # Errors
    ///
    /// * Token acquisition fails (bearer auth)
    /// * The service is unreachable or the deadline passes
    /// * The status is not 200 OK; the error carries the status and raw body
    /// * The body is not completion JSON, or holds no choices
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cgen::client::OpenAiClient;
    /// use cgen::config::{Config, ConfigOptions};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), cgen::error::CgenError> {
    /// let config = Config::new(
    ///     "https://example.openai.azure.com",
    ///     "gpt-4",
    ///     ConfigOptions {
    ///         api_key: Some("key".to_string()),
    ///         ..Default::default()
    ///     },
    /// )?;
    /// let message = OpenAiClient::new(config)
    ///     .get_commit_message("diff --git a/x b/x\n+foo\n")
    ///     .await?;
    /// println!("{}", message);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_commit_message(&self, diff: &str) -> Result<String> {
        let mut conversation = Conversation::new(self.config.system_context.clone());
        conversation.push(Message::user(diff));

        let request = self
            .http
            .post(&self.config.url)
            .timeout(self.timeout)
            .json(&build_request(&conversation));
        let request = self
            .config
            .auth
            .apply(request, &self.http, self.timeout)
            .await?;

        info!(url = %self.config.url, diff_len = diff.len(), "Sending chat completion request");
        let response = request.send().await.map_err(CgenError::Transport)?;

        let status = response.status();
        let text = response.text().await.map_err(CgenError::Transport)?;
        debug!(status = status.as_u16(), body_len = text.len(), "Received response");

        if status != StatusCode::OK {
            return Err(CgenError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let reply = parse_response(&text)?;
        let content = reply.content.clone();
        conversation.push(reply);
        debug!(
            turns = conversation.messages().len(),
            "Conversation complete"
        );

        Ok(content)
    }
}

/// Build the request body for a conversation
///
/// Messages are sent in conversation order, system message first.
///
/// # Arguments
///
/// * `conversation` - Conversation to send
///
/// # Returns
///
/// * `CompletionRequest` - Body borrowing the conversation's messages
///
/// # Example
///
/// ```
/// use cgen::client::build_request;
/// use cgen::message::{Conversation, Message};
///
/// let mut conversation = Conversation::new(Message::system("rules"));
/// conversation.push(Message::user("+added line"));
///
/// let json = serde_json::to_string(&build_request(&conversation)).unwrap();
/// assert_eq!(
///     json,
///     r#"{"messages":[{"role":"system","content":"rules"},{"role":"user","content":"+added line"}]}"#
/// );
/// ```
pub fn build_request(conversation: &Conversation) -> CompletionRequest<'_> {
    CompletionRequest {
        messages: conversation.messages(),
    }
}

/// Parse a 200 response body and return the first choice's message
///
/// # Errors
///
/// * The body is not JSON or has no `choices` array
/// * The `choices` array is empty
pub fn parse_response(body: &str) -> Result<Message> {
    let parsed: CompletionResponse = serde_json::from_str(body).map_err(CgenError::Decode)?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| CgenError::MalformedResponse("no choices in response".to_string()))
}
