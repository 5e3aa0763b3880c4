// Meetbrief API Library
// Decision: Shared library for binaries (API server, OpenAPI export) and integration tests

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Authentication module
pub mod auth;

// Configuration and router wiring
pub mod app;
pub mod config;

// OpenAPI spec generation
pub mod openapi;

pub use app::{build_app, AppServices};
pub use config::AppConfig;
