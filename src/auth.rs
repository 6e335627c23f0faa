//! Authentication strategies for outgoing requests
//!
//! A client carries exactly one [`Auth`] variant, picked at construction:
//! a static `api-key` header, or a bearer token fetched from Azure identity
//! right before each request. Tokens are not cached between calls.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{CgenError, Result};

/// Scope requested for Azure OpenAI access tokens
pub const OPENAI_SCOPE: &str = "https://openai.azure.com/.default";

/// Authority used by [`Credential::ClientSecret`] when none is configured
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Short-lived token returned by the identity provider
pub struct AccessToken {
    pub token: String,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken").finish_non_exhaustive()
    }
}

/// Source of Azure identity tokens
#[derive(Clone)]
pub enum Credential {
    /// Token from the signed-in Azure CLI (`az account get-access-token`)
    AzureCli,
    /// OAuth2 client-credentials grant against Microsoft Entra ID
    ClientSecret {
        authority_host: String,
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::AzureCli => f.write_str("AzureCli"),
            Credential::ClientSecret {
                authority_host,
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("authority_host", authority_host)
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenOutput {
    access_token: String,
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

impl Credential {
    /// Obtain a fresh access token for `scope`
    ///
    /// # Arguments
    ///
    /// * `http` - Client used for the token endpoint
    /// * `scope` - OAuth2 scope, usually [`OPENAI_SCOPE`]
    /// * `timeout` - Deadline for the CLI call or token request
    ///
    /// # Errors
    ///
    /// * The Azure CLI is missing, times out, exits non-zero, or prints unexpected output
    /// * The token endpoint is unreachable, answers non-200, or returns unexpected JSON
    pub async fn get_token(
        &self,
        http: &Client,
        scope: &str,
        timeout: Duration,
    ) -> Result<AccessToken> {
        match self {
            Credential::AzureCli => azure_cli_token(scope, timeout).await,
            Credential::ClientSecret {
                authority_host,
                tenant_id,
                client_id,
                client_secret,
            } => {
                let url = token_url(authority_host, tenant_id);
                debug!(url = %url, client_id = %client_id, "Requesting client-credentials token");

                let response = http
                    .post(&url)
                    .timeout(timeout)
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("scope", scope),
                    ])
                    .send()
                    .await
                    .map_err(|e| CgenError::Auth(format!("unable to reach token endpoint: {e}")))?;

                let status = response.status();
                let body = response
                    .text()
                    .await
                    .map_err(|e| CgenError::Auth(format!("unable to read token response: {e}")))?;

                if !status.is_success() {
                    return Err(CgenError::Auth(format!(
                        "token endpoint returned status {}: {}",
                        status.as_u16(),
                        body
                    )));
                }

                let parsed: OAuthTokenResponse = serde_json::from_str(&body)
                    .map_err(|e| CgenError::Auth(format!("unable to parse token response: {e}")))?;

                Ok(AccessToken {
                    token: parsed.access_token,
                })
            }
        }
    }
}

fn token_url(authority_host: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        authority_host.trim_end_matches('/'),
        tenant_id
    )
}

async fn azure_cli_token(scope: &str, timeout: Duration) -> Result<AccessToken> {
    debug!(scope = %scope, "Requesting token from Azure CLI");

    let output = tokio::time::timeout(
        timeout,
        Command::new("az")
            .args(["account", "get-access-token", "--scope", scope, "--output", "json"])
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| CgenError::Auth(format!("Azure CLI did not respond within {:?}", timeout)))?
    .map_err(|e| {
        CgenError::Auth(format!(
            "failed to execute 'az'. Make sure Azure CLI is installed and in PATH: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(CgenError::Auth(format!(
            "Azure CLI failed with exit code {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_cli_output(&output.stdout)
}

fn parse_cli_output(stdout: &[u8]) -> Result<AccessToken> {
    let parsed: CliTokenOutput = serde_json::from_slice(stdout)
        .map_err(|e| CgenError::Auth(format!("unable to parse Azure CLI output: {e}")))?;
    Ok(AccessToken {
        token: parsed.access_token,
    })
}

/// Credential decoration applied to every outgoing request
#[derive(Clone)]
pub enum Auth {
    /// Static key sent in the `api-key` header
    ApiKey(String),
    /// Bearer token fetched per request
    Bearer(Credential),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Auth::Bearer(credential) => f.debug_tuple("Bearer").field(credential).finish(),
        }
    }
}

impl Auth {
    /// Short name of the strategy, safe to log
    ///
    /// # Example
    ///
    /// ```
    /// use cgen::auth::Auth;
    ///
    /// assert_eq!(Auth::ApiKey("key".to_string()).kind(), "api-key");
    /// ```
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::ApiKey(_) => "api-key",
            Auth::Bearer(_) => "bearer",
        }
    }

    /// Attach credentials to `request`
    ///
    /// For [`Auth::Bearer`] this fetches a new token first; a failed fetch
    /// fails the whole request.
    ///
    /// # Arguments
    ///
    /// * `request` - Outgoing request to decorate
    /// * `http` - Client used for the token endpoint
    /// * `timeout` - Deadline for token acquisition
    ///
    /// # Returns
    ///
    /// * `Result<RequestBuilder>` - The request with its auth header set
    pub async fn apply(
        &self,
        request: RequestBuilder,
        http: &Client,
        timeout: Duration,
    ) -> Result<RequestBuilder> {
        match self {
            Auth::ApiKey(key) => Ok(request.header("api-key", key)),
            Auth::Bearer(credential) => {
                let token = credential.get_token(http, OPENAI_SCOPE, timeout).await?;
                info!("Acquired Azure access token");
                Ok(request.bearer_auth(token.token))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_secret(authority_host: &str) -> Credential {
        Credential::ClientSecret {
            authority_host: authority_host.to_string(),
            tenant_id: "tenant-1".to_string(),
            client_id: "client-1".to_string(),
            client_secret: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_token_url_trims_trailing_slash() {
        assert_eq!(
            token_url("https://login.microsoftonline.com/", "t"),
            "https://login.microsoftonline.com/t/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_parse_cli_output() {
        // Arrange - shape printed by `az account get-access-token`
        let stdout = br#"{"accessToken":"eyJ0","expiresOn":"2026-10-19 12:00:00.000000","tokenType":"Bearer"}"#;

        // Act
        let token = parse_cli_output(stdout).unwrap();

        // Assert
        assert_eq!(token.token, "eyJ0");
    }

    #[test]
    fn test_parse_cli_output_garbage() {
        let result = parse_cli_output(b"ERROR: Please run 'az login'");
        assert!(matches!(result, Err(CgenError::Auth(_))));
    }

    #[test]
    fn test_auth_debug_hides_api_key() {
        // Arrange
        let auth = Auth::ApiKey("sk-very-secret".to_string());

        // Act
        let debug = format!("{:?}", auth);

        // Assert - strategy is visible, key is not
        assert!(debug.contains("ApiKey"));
        assert!(!debug.contains("sk-very-secret"));
    }

    #[test]
    fn test_credential_debug_hides_secret() {
        let debug = format!("{:?}", client_secret("https://login"));
        assert!(debug.contains("client-1"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_client_secret_token() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"token_type":"Bearer","expires_in":3599,"access_token":"tok-123"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        // Act
        let token = client_secret(&server.uri())
            .get_token(&Client::new(), OPENAI_SCOPE, Duration::from_secs(5))
            .await
            .unwrap();

        // Assert
        assert_eq!(token.token, "tok-123");
    }

    #[tokio::test]
    async fn test_client_secret_token_rejected() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        // Act
        let result = client_secret(&server.uri())
            .get_token(&Client::new(), OPENAI_SCOPE, Duration::from_secs(5))
            .await;

        // Assert
        let err = result.unwrap_err();
        assert!(matches!(err, CgenError::Auth(_)));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid_client"));
    }

    #[tokio::test]
    async fn test_api_key_apply_sets_header() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("api-key", "secret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let http = Client::new();

        // Act
        let request = Auth::ApiKey("secret".to_string())
            .apply(http.get(server.uri()), &http, Duration::from_secs(5))
            .await
            .unwrap();
        let response = request.send().await.unwrap();

        // Assert
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_bearer_apply_fetches_token() {
        // Arrange - one server plays both identity provider and target
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"access_token":"tok-abc"}"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/target"))
            .and(header("authorization", "Bearer tok-abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let http = Client::new();
        let auth = Auth::Bearer(client_secret(&server.uri()));

        // Act
        let request = auth
            .apply(
                http.get(format!("{}/target", server.uri())),
                &http,
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        let response = request.send().await.unwrap();

        // Assert
        assert_eq!(response.status().as_u16(), 200);
    }
}
