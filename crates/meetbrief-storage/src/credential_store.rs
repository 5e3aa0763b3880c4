// Database-backed CredentialStore implementation
//
// The stored Google account is the source of the calendar access token.

use async_trait::async_trait;
use meetbrief_core::{traits::CredentialStore, MeetingError, Result};
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::StorageBackend;

/// Provider name of accounts created by Google sign-in
pub const GOOGLE_PROVIDER: &str = "google";

#[derive(Clone)]
pub struct DbCredentialStore {
    db: Arc<StorageBackend>,
}

impl DbCredentialStore {
    pub fn new(db: Arc<StorageBackend>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for DbCredentialStore {
    async fn access_token(&self, user_id: Uuid) -> Result<Option<String>> {
        let account = self
            .db
            .get_account(user_id, GOOGLE_PROVIDER)
            .await
            .map_err(|e| MeetingError::store(e.to_string()))?;

        // TODO: exchange refresh_token for a new access token once expires_at has passed
        Ok(account
            .and_then(|a| a.access_token)
            .filter(|token| !token.is_empty()))
    }
}

/// Create a credential store backed by the given storage
pub fn create_db_credential_store(db: Arc<StorageBackend>) -> DbCredentialStore {
    DbCredentialStore::new(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpsertAccount;

    fn account(user_id: Uuid, provider: &str, token: Option<&str>) -> UpsertAccount {
        UpsertAccount {
            user_id,
            provider: provider.to_string(),
            provider_account_id: format!("{}-sub", provider),
            access_token: token.map(str::to_string),
            refresh_token: None,
            expires_at: None,
            scope: None,
        }
    }

    #[tokio::test]
    async fn test_access_token_from_google_account() {
        let db = Arc::new(StorageBackend::in_memory());
        let store = create_db_credential_store(db.clone());
        let user_id = Uuid::now_v7();

        assert!(store.access_token(user_id).await.unwrap().is_none());

        db.upsert_account(account(user_id, GOOGLE_PROVIDER, Some("ya29.token")))
            .await
            .unwrap();

        assert_eq!(
            store.access_token(user_id).await.unwrap().as_deref(),
            Some("ya29.token")
        );
    }

    #[tokio::test]
    async fn test_ignores_other_providers_and_empty_tokens() {
        let db = Arc::new(StorageBackend::in_memory());
        let store = DbCredentialStore::new(db.clone());
        let user_id = Uuid::now_v7();

        db.upsert_account(account(user_id, "github", Some("gh-token")))
            .await
            .unwrap();
        assert!(store.access_token(user_id).await.unwrap().is_none());

        db.upsert_account(account(user_id, GOOGLE_PROVIDER, Some("")))
            .await
            .unwrap();
        assert!(store.access_token(user_id).await.unwrap().is_none());
    }
}
