// OAuth service for Google sign-in
// Decision: Manual OAuth2 implementation to avoid http crate version conflicts
// Decision: Request calendar.readonly at sign-in so the stored token can list events

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::config::GoogleOAuthConfig;

/// Scopes requested from Google
pub const GOOGLE_SCOPES: &str =
    "openid email profile https://www.googleapis.com/auth/calendar.readonly";

/// User info from OAuth provider
#[derive(Debug, Clone)]
pub struct OAuthUserInfo {
    /// Provider user ID
    pub provider_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
}

/// Tokens granted by the provider
#[derive(Debug, Clone)]
pub struct OAuthTokens {
    pub access_token: String,
    /// Only present when the user (re-)consented
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

/// Result of a completed authorization-code exchange
#[derive(Debug, Clone)]
pub struct OAuthSignIn {
    pub user: OAuthUserInfo,
    pub tokens: OAuthTokens,
}

/// Google OAuth service
pub struct GoogleOAuthService {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    allowed_domains: Option<Vec<String>>,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuthService {
    pub fn new(config: &GoogleOAuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.base.client_id.clone(),
            client_secret: config.base.client_secret.clone(),
            redirect_uri: config.base.redirect_uri.clone(),
            allowed_domains: config.allowed_domains.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            userinfo_url: config.userinfo_url.clone(),
        }
    }

    /// Generate authorization URL for OAuth flow
    pub fn authorization_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", GOOGLE_SCOPES),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.auth_url, query)
    }

    /// Check the email against the configured domain allow-list
    pub fn is_email_allowed(&self, email: &str) -> bool {
        let Some(domains) = &self.allowed_domains else {
            return true;
        };

        email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_lowercase())
            .is_some_and(|domain| domains.iter().any(|d| *d == domain))
    }

    /// Exchange authorization code for tokens and user info
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthSignIn> {
        let token_response: GoogleTokenResponse = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Failed to exchange code")?
            .error_for_status()
            .context("Token endpoint rejected the code")?
            .json()
            .await
            .context("Failed to parse token response")?;

        let user_info: GoogleUserInfo = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(&token_response.access_token)
            .send()
            .await
            .context("Failed to fetch user info")?
            .error_for_status()
            .context("User info request failed")?
            .json()
            .await
            .context("Failed to parse user info")?;

        let expires_at = token_response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Ok(OAuthSignIn {
            user: OAuthUserInfo {
                provider_id: user_info.sub,
                name: user_info
                    .name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| user_info.email.clone()),
                email: user_info.email,
                avatar_url: user_info.picture,
                email_verified: user_info.email_verified.unwrap_or(false),
            },
            tokens: OAuthTokens {
                access_token: token_response.access_token,
                refresh_token: token_response.refresh_token,
                expires_at,
                scope: token_response.scope,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
    email_verified: Option<bool>,
}

/// URL encoding helper
mod urlencoding {
    pub fn encode(s: &str) -> String {
        let mut result = String::new();
        for byte in s.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    result.push(byte as char)
                }
                _ => result.push_str(&format!("%{:02X}", byte)),
            }
        }
        result
    }
}
