// Session tokens
// Decision: HS256 JWT in an HttpOnly cookie (or Bearer header for API clients)
// Decision: A session remembers which Google account granted calendar access, so
// re-linking a different account invalidates older sessions
// Decision: No refresh tokens; the session expires and the user signs in again

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::JwtConfig;

const SESSION_ISSUER: &str = "meetbrief";
const SESSION_AUDIENCE: &str = "meetbrief-dashboard";

/// Who a session belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    /// Google `sub` of the account whose calendar this session reads
    pub google_account_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    email: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    google_sub: Option<String>,
    iss: String,
    aud: String,
    exp: i64,
    iat: i64,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct JwtService {
    lifetime: std::time::Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.set_audience(&[SESSION_AUDIENCE]);

        Self {
            lifetime: config.access_token_lifetime,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, identity: &SessionIdentity) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::from_std(self.lifetime)?;

        let claims = SessionClaims {
            sub: identity.user_id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            google_sub: identity.google_account_id.clone(),
            iss: SESSION_ISSUER.to_string(),
            aud: SESSION_AUDIENCE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode session token")
    }

    /// Check signature, expiry, issuer and audience
    pub fn verify(&self, token: &str) -> Result<SessionIdentity> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .context("Invalid session token")?
            .claims;

        Ok(SessionIdentity {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            google_account_id: claims.google_sub,
        })
    }

    /// Session cookie max-age
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.as_secs() as i64
    }
}
