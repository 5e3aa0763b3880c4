// API routes and types (shared for OpenAPI generation)

pub mod common;
pub mod mcp;
pub mod meetings;

pub use common::ErrorResponse;
