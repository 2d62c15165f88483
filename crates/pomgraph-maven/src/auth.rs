//! OAuth2 access tokens for Google-hosted Maven repositories.
//!
//! A credential file (the JSON a `gcloud` service account or user login
//! produces) is exchanged for a short-lived bearer token. The exchange
//! itself sits behind [`TokenProvider`] so resolution can run against a
//! fake provider in tests.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use pomgraph_util::errors::PomgraphError;

/// OAuth2 scope requested for repository access.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_SKEW: Duration = Duration::from_secs(10);

/// A bearer token and the instant it stops being accepted.
#[derive(Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_at: Option<Instant>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>, expires_in: Option<Duration>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: expires_in.map(|d| Instant::now() + d),
        }
    }

    pub fn is_valid(&self) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at {
            Some(at) => Instant::now() + EXPIRY_SKEW < at,
            None => true,
        }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchanges the raw bytes of a credential file for an access token.
pub trait TokenProvider: Send + Sync {
    fn exchange(
        &self,
        credentials: &[u8],
    ) -> impl Future<Output = Result<AccessToken, PomgraphError>> + Send;
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default)]
        token_uri: Option<String>,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Token exchange against Google's OAuth2 endpoint.
///
/// Supports `service_account` keys (signed JWT assertion) and
/// `authorized_user` credentials (refresh-token grant).
#[derive(Debug, Clone)]
pub struct GoogleTokenProvider {
    client: Client,
    scope: String,
}

impl GoogleTokenProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
        }
    }

    /// Token endpoint and form body for a credential file.
    fn token_request(
        &self,
        credentials: &[u8],
    ) -> Result<(String, Vec<(&'static str, String)>), PomgraphError> {
        let creds: CredentialsFile = serde_json::from_slice(credentials)
            .map_err(|e| auth_err(format!("failed to parse credentials: {e}")))?;

        match creds {
            CredentialsFile::ServiceAccount {
                client_email,
                private_key,
                token_uri,
            } => {
                let token_uri = token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
                let iat = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|e| auth_err(format!("system clock before epoch: {e}")))?
                    .as_secs();
                let claims = AssertionClaims {
                    iss: &client_email,
                    scope: &self.scope,
                    aud: &token_uri,
                    iat,
                    exp: iat + ASSERTION_LIFETIME_SECS,
                };
                let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
                    .map_err(|e| auth_err(format!("failed to parse credentials: {e}")))?;
                let assertion =
                    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
                        .map_err(|e| auth_err(format!("failed to sign token assertion: {e}")))?;
                Ok((
                    token_uri,
                    vec![
                        ("grant_type", JWT_BEARER_GRANT.to_string()),
                        ("assertion", assertion),
                    ],
                ))
            }
            CredentialsFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
            } => Ok((
                DEFAULT_TOKEN_URI.to_string(),
                vec![
                    ("grant_type", "refresh_token".to_string()),
                    ("client_id", client_id),
                    ("client_secret", client_secret),
                    ("refresh_token", refresh_token),
                ],
            )),
        }
    }
}

impl TokenProvider for GoogleTokenProvider {
    async fn exchange(&self, credentials: &[u8]) -> Result<AccessToken, PomgraphError> {
        let (token_uri, form) = self.token_request(credentials)?;

        let resp = self
            .client
            .post(&token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| auth_err(format!("failed to get access token: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(auth_err(format!(
                "token endpoint {token_uri} returned HTTP {status}"
            )));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| auth_err(format!("malformed token response: {e}")))?;
        Ok(AccessToken::new(
            body.access_token,
            body.expires_in.map(Duration::from_secs),
        ))
    }
}

fn auth_err(message: String) -> PomgraphError {
    PomgraphError::Auth { message }
}
