//! Error types for commit message generation
//!
//! Every failure is terminal for the single request a run performs.

use thiserror::Error;

/// Errors produced while configuring, authenticating or calling the service.
#[derive(Error, Debug)]
pub enum CgenError {
    /// Missing or contradictory configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable is unset or empty.
    #[error("{0} is not set")]
    MissingEnv(&'static str),

    /// Token acquisition from the identity provider failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The service could not be reached or the request timed out.
    #[error("Unable to send request")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a status other than 200 OK.
    #[error("Request failed with status code {status} and body {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body is not valid completion JSON.
    #[error("Unable to parse response")]
    Decode(#[source] serde_json::Error),

    /// The response parsed but lacks the expected content.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The prompt file could not be read.
    #[error("Failed to read prompt file: {path}")]
    PromptFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The prompt file is not valid TOML or lacks the `prompt` field.
    #[error("Failed to parse prompt file as TOML: {path}")]
    PromptFileParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, CgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display_contains_status_and_body() {
        // Arrange
        let err = CgenError::HttpStatus {
            status: 429,
            body: r#"{"error":"slow down"}"#.to_string(),
        };

        // Act
        let msg = err.to_string();

        // Assert - body is reported verbatim
        assert!(msg.contains("429"));
        assert!(msg.contains(r#"{"error":"slow down"}"#));
    }

    #[test]
    fn test_missing_env_display() {
        let err = CgenError::MissingEnv("OPENAI_ENDPOINT");
        assert_eq!(err.to_string(), "OPENAI_ENDPOINT is not set");
    }

    #[test]
    fn test_decode_keeps_source() {
        // Arrange
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        // Act
        let err = CgenError::Decode(parse_err);

        // Assert - the serde error stays reachable through the chain
        assert!(std::error::Error::source(&err).is_some());
    }
}
