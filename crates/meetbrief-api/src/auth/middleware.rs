// Authentication middleware and extractors
// Decision: Support both cookie-based (UI) and header-based (API) auth
// Decision: Handlers that must answer 401 with a fixed body take OptionalAuthUser

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use meetbrief_core::UserSession;
use meetbrief_storage::StorageBackend;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{config::AuthConfig, jwt::JwtService};

/// Name of the session cookie
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authentication error
#[derive(Debug, Clone, Serialize)]
pub struct AuthError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl AuthError {
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn forbidden(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::FORBIDDEN,
        }
    }

    pub fn internal(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Authenticated user context extracted from request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// Google account the session was issued for
    pub google_account_id: Option<String>,
}

impl AuthUser {
    /// Session handed to the calendar and sync services
    pub fn session(&self) -> UserSession {
        UserSession {
            user_id: self.id,
            email: self.email.clone(),
        }
    }
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
    pub db: Arc<StorageBackend>,
}

impl AuthState {
    pub fn new(config: AuthConfig, db: Arc<StorageBackend>) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        Self {
            config,
            jwt_service,
            db,
        }
    }
}

/// Extractor for authenticated user
/// This is required - returns 401 if not authenticated
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        extract_auth_user(parts, &auth_state)
    }
}

/// Helper trait for extracting AuthState from application state
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

/// Extract authenticated user from request
fn extract_auth_user(parts: &Parts, auth_state: &AuthState) -> Result<AuthUser, AuthError> {
    // Try to extract from Authorization header first
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AuthError::unauthorized("Invalid authorization header"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return validate_jwt_token(token, auth_state);
        }
    }

    // Try to extract from cookie (for UI)
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return validate_jwt_token(cookie.value(), auth_state);
    }

    Err(AuthError::unauthorized("Authentication required"))
}

/// Validate JWT token and return user
fn validate_jwt_token(token: &str, auth_state: &AuthState) -> Result<AuthUser, AuthError> {
    let identity = auth_state.jwt_service.verify(token).map_err(|e| {
        tracing::debug!("JWT validation failed: {:#}", e);
        AuthError::unauthorized("Invalid or expired token")
    })?;

    Ok(AuthUser {
        id: identity.user_id,
        email: identity.email,
        name: identity.name,
        google_account_id: identity.google_account_id,
    })
}

/// Optional auth extractor - returns None if not authenticated
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn session(&self) -> Option<UserSession> {
        self.0.as_ref().map(AuthUser::session)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(OptionalAuthUser(extract_auth_user(parts, &auth_state).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::JwtConfig;
    use crate::auth::jwt::SessionIdentity;
    use axum::http::Request;
    use std::time::Duration;

    fn auth_state() -> AuthState {
        let config = AuthConfig {
            jwt: JwtConfig {
                secret: "middleware-test-secret".to_string(),
                access_token_lifetime: Duration::from_secs(600),
            },
            ..Default::default()
        };
        AuthState::new(config, Arc::new(StorageBackend::in_memory()))
    }

    fn parts_with(name: header::HeaderName, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_auth_error() {
        let error = AuthError::unauthorized("Test error");
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);
        assert_eq!(error.error, "Test error");

        let forbidden = AuthError::forbidden("Forbidden");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_extract_from_bearer_header() {
        let state = auth_state();
        let user_id = Uuid::now_v7();
        let token = state
            .jwt_service
            .issue(&SessionIdentity {
                user_id,
                email: "ann@example.com".to_string(),
                name: "Ann".to_string(),
                google_account_id: Some("google-sub".to_string()),
            })
            .unwrap();

        let parts = parts_with(header::AUTHORIZATION, &format!("Bearer {}", token));
        let user = extract_auth_user(&parts, &state).unwrap();

        assert_eq!(user.id, user_id);
        assert_eq!(user.google_account_id.as_deref(), Some("google-sub"));
        assert_eq!(
            user.session(),
            UserSession {
                user_id,
                email: "ann@example.com".to_string()
            }
        );
    }

    #[test]
    fn test_extract_from_cookie() {
        let state = auth_state();
        let token = state
            .jwt_service
            .issue(&SessionIdentity {
                user_id: Uuid::now_v7(),
                email: "bob@example.com".to_string(),
                name: "Bob".to_string(),
                google_account_id: None,
            })
            .unwrap();

        let parts = parts_with(header::COOKIE, &format!("{}={}", ACCESS_TOKEN_COOKIE, token));
        let user = extract_auth_user(&parts, &state).unwrap();
        assert_eq!(user.email, "bob@example.com");
    }

    #[test]
    fn test_missing_or_invalid_credentials() {
        let state = auth_state();

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert!(extract_auth_user(&parts, &state).is_err());

        let parts = parts_with(header::AUTHORIZATION, "Bearer not-a-jwt");
        let err = extract_auth_user(&parts, &state).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
