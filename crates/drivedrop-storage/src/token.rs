//! OAuth2 client-credentials token provider.

use async_trait::async_trait;
use drivedrop_core::{truncate_chars, Credentials, MAX_ERROR_BODY_CHARS};
use percent_encoding::utf8_percent_encode;
use reqwest::Client;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Instant;

use crate::graph::PATH_SEGMENT;
use crate::response::ParsedResponse;
use crate::traits::{AccessToken, DriveError, DriveResult, TokenProvider};

/// Exchanges the service principal's id and secret for a bearer token at
/// `{login_base_url}/{tenant}/oauth2/v2.0/token`.
#[derive(Clone)]
pub struct ClientCredentialsProvider {
    http_client: Client,
    login_base_url: String,
    scope: String,
}

impl Debug for ClientCredentialsProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClientCredentialsProvider")
            .field("login_base_url", &self.login_base_url)
            .field("scope", &self.scope)
            .finish()
    }
}

impl ClientCredentialsProvider {
    pub fn new(http_client: Client, login_base_url: &str, scope: &str) -> Self {
        Self {
            http_client,
            login_base_url: login_base_url.trim_end_matches('/').to_string(),
            scope: scope.to_string(),
        }
    }

    fn token_url(&self, tenant_id: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base_url,
            utf8_percent_encode(tenant_id, PATH_SEGMENT)
        )
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn fetch_token(&self, credentials: &Credentials) -> DriveResult<AccessToken> {
        credentials.validate()?;
        let start = Instant::now();

        let form = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(self.token_url(&credentials.tenant_id))
            .form(&form)
            .send()
            .await
            .map_err(|e| DriveError::Transport {
                operation: "token request",
                message: truncate_chars(&e.to_string(), MAX_ERROR_BODY_CHARS),
            })?;

        let parsed = ParsedResponse::read(response).await;
        if !parsed.is_success() {
            tracing::warn!(
                status = parsed.status,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Token request rejected"
            );
            return Err(DriveError::Auth {
                status: Some(parsed.status),
                body: parsed.truncated_body(),
            });
        }

        match parsed.str_field("access_token") {
            Some(token) => {
                tracing::debug!(
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Access token acquired"
                );
                Ok(AccessToken::new(token))
            }
            None => Err(DriveError::Auth {
                status: Some(parsed.status),
                body: parsed.truncated_body(),
            }),
        }
    }
}
