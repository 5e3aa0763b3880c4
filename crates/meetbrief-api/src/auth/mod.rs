// Authentication module
// Decision: Google OAuth sign-in with JWT session cookies
// Decision: Calendar access tokens are stored per account and never sent to the browser

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod routes;

pub use config::AuthConfig;
pub use middleware::{AuthState, AuthUser, FromRef, OptionalAuthUser};
pub use routes::routes;
