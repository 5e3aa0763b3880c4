// Authentication HTTP routes
// Decision: Google OAuth is the only way in; the callback stores the calendar credential
// Decision: OAuth state travels in a short-lived HttpOnly cookie for CSRF validation

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use meetbrief_storage::{UpsertAccount, UpsertUser, GOOGLE_PROVIDER};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    jwt::SessionIdentity,
    middleware::{AuthError, AuthState, AuthUser, ACCESS_TOKEN_COOKIE},
    oauth::GoogleOAuthService,
};

/// Cookie holding the pending OAuth state
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// How long a sign-in attempt may take
const OAUTH_STATE_MAX_AGE_SECS: i64 = 10 * 60;

/// Generate a random state string for OAuth (32 hex characters)
fn generate_oauth_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// User info response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfoResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    /// A Google calendar token is stored for this user
    pub calendar_connected: bool,
}

/// OAuth callback query parameters
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by Google when the user denies consent
    pub error: Option<String>,
}

/// Auth configuration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthConfigResponse {
    pub oauth_providers: Vec<String>,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        // Public routes
        .route("/auth/config", get(get_auth_config))
        .route("/auth/logout", post(logout))
        // OAuth routes
        .route("/auth/oauth/google", get(oauth_redirect))
        .route("/auth/callback/google", get(oauth_callback))
        // Protected routes
        .route("/auth/me", get(get_current_user))
        .with_state(state)
}

/// GET /auth/config - Get authentication configuration
#[utoipa::path(
    get,
    path = "/auth/config",
    responses(
        (status = 200, description = "Sign-in options", body = AuthConfigResponse)
    ),
    tag = "auth"
)]
pub async fn get_auth_config(State(state): State<AuthState>) -> Json<AuthConfigResponse> {
    let mut oauth_providers = Vec::new();

    if state.config.oauth_enabled() {
        oauth_providers.push(GOOGLE_PROVIDER.to_string());
    }

    Json(AuthConfigResponse { oauth_providers })
}

/// POST /auth/logout - Logout (clear cookies)
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
}

/// GET /auth/me - Get current user info
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Signed-in user", body = UserInfoResponse),
        (status = 401, description = "Not signed in")
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<AuthState>,
    user: AuthUser,
) -> Result<Json<UserInfoResponse>, AuthError> {
    let stored = state.db.get_user(user.id).await.map_err(|e| {
        tracing::error!("Failed to load user: {}", e);
        AuthError::internal("Failed to load user")
    })?;

    // A token can outlive an in-memory database restart
    let stored = stored.ok_or_else(|| AuthError::unauthorized("User no longer exists"))?;

    let account = state
        .db
        .get_account(user.id, GOOGLE_PROVIDER)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load Google account: {}", e);
            AuthError::internal("Failed to load user")
        })?;

    if let (Some(bound), Some(account)) = (&user.google_account_id, &account) {
        if *bound != account.provider_account_id {
            tracing::info!(user_id = %user.id, "Session issued for a previously linked Google account");
            return Err(AuthError::unauthorized("Session no longer matches the linked Google account"));
        }
    }

    let calendar_connected = account
        .and_then(|a| a.access_token)
        .is_some_and(|token| !token.is_empty());

    Ok(Json(UserInfoResponse {
        id: stored.id.to_string(),
        email: stored.email,
        name: stored.name,
        avatar_url: stored.avatar_url,
        calendar_connected,
    }))
}

/// GET /auth/oauth/google - Redirect to Google
pub async fn oauth_redirect(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let config = state
        .config
        .google
        .as_ref()
        .ok_or_else(|| AuthError::unauthorized("Google OAuth not configured"))?;

    // Generate a random state for CSRF protection
    let oauth_state = generate_oauth_state();
    let auth_url = GoogleOAuthService::new(config).authorization_url(&oauth_state);

    let state_cookie = Cookie::build((OAUTH_STATE_COOKIE, oauth_state))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(OAUTH_STATE_MAX_AGE_SECS))
        .build();

    Ok((jar.add(state_cookie), Redirect::to(&auth_url)))
}

/// GET /auth/callback/google - OAuth callback
pub async fn oauth_callback(
    State(state): State<AuthState>,
    Query(query): Query<OAuthCallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    if let Some(error) = &query.error {
        tracing::warn!(error = %error, "Google sign-in was not completed");
        return Err(AuthError::unauthorized("OAuth authentication failed"));
    }

    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    match (&expected_state, &query.state) {
        (Some(expected), Some(actual)) if !expected.is_empty() && expected == actual => {}
        _ => {
            tracing::warn!("OAuth state mismatch");
            return Err(AuthError::unauthorized("Invalid OAuth state"));
        }
    }

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::unauthorized("Missing authorization code"))?;

    let config = state
        .config
        .google
        .as_ref()
        .ok_or_else(|| AuthError::unauthorized("Google OAuth not configured"))?;
    let service = GoogleOAuthService::new(config);

    let sign_in = service.exchange_code(code).await.map_err(|e| {
        tracing::error!("OAuth exchange failed: {:#}", e);
        AuthError::unauthorized("OAuth authentication failed")
    })?;

    if !service.is_email_allowed(&sign_in.user.email) {
        tracing::warn!(email = %sign_in.user.email, "Sign-in from a domain outside the allow-list");
        return Err(AuthError::forbidden("Email domain not allowed"));
    }

    let user = state
        .db
        .upsert_user(UpsertUser {
            email: sign_in.user.email.clone(),
            name: sign_in.user.name.clone(),
            avatar_url: sign_in.user.avatar_url.clone(),
        })
        .await
        .map_err(|e| {
            tracing::error!("User upsert error during OAuth: {}", e);
            AuthError::internal("OAuth authentication failed")
        })?;

    state
        .db
        .upsert_account(UpsertAccount {
            user_id: user.id,
            provider: GOOGLE_PROVIDER.to_string(),
            provider_account_id: sign_in.user.provider_id.clone(),
            access_token: Some(sign_in.tokens.access_token),
            refresh_token: sign_in.tokens.refresh_token,
            expires_at: sign_in.tokens.expires_at,
            scope: sign_in.tokens.scope,
        })
        .await
        .map_err(|e| {
            tracing::error!("Account upsert error during OAuth: {}", e);
            AuthError::internal("OAuth authentication failed")
        })?;

    tracing::info!(
        user_id = %user.id,
        email_verified = sign_in.user.email_verified,
        "User signed in with Google"
    );

    let access_token = state
        .jwt_service
        .issue(&SessionIdentity {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            google_account_id: Some(sign_in.user.provider_id.clone()),
        })
        .map_err(|e| {
            tracing::error!("Token generation error: {}", e);
            AuthError::internal("Login failed")
        })?;

    let access_cookie = Cookie::build((ACCESS_TOKEN_COOKIE, access_token))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            state.jwt_service.lifetime_secs(),
        ))
        .build();

    let jar = jar
        .remove(Cookie::build(OAUTH_STATE_COOKIE).path("/"))
        .add(access_cookie);

    // Redirect to frontend
    Ok((jar, Redirect::to("/")))
}
