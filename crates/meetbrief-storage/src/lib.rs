// Storage layer for the meeting dashboard
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// This crate provides database implementations for core traits:
// - DbMeetingStore: implements MeetingStore for meetings and summaries
// - DbCredentialStore: implements CredentialStore for calendar access tokens

pub mod backend;
pub mod credential_store;
pub mod meeting_store;
pub mod memory;
pub mod models;
pub mod repositories;

pub use backend::StorageBackend;
pub use credential_store::{create_db_credential_store, DbCredentialStore, GOOGLE_PROVIDER};
pub use meeting_store::{create_db_meeting_store, DbMeetingStore};
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::*;
