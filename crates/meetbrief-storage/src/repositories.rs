// Repository layer for database operations

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ============================================
    // Users
    // ============================================

    pub async fn upsert_user(&self, input: UpsertUser) -> Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, name, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                avatar_url = COALESCE(EXCLUDED.avatar_url, users.avatar_url),
                updated_at = NOW()
            RETURNING id, email, name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.email)
        .bind(&input.name)
        .bind(&input.avatar_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, avatar_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Accounts (OAuth credentials)
    // ============================================

    pub async fn upsert_account(&self, input: UpsertAccount) -> Result<AccountRow> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (id, user_id, provider, provider_account_id, access_token, refresh_token, expires_at, scope)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (provider, provider_account_id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                access_token = EXCLUDED.access_token,
                refresh_token = COALESCE(EXCLUDED.refresh_token, accounts.refresh_token),
                expires_at = EXCLUDED.expires_at,
                scope = EXCLUDED.scope,
                updated_at = NOW()
            RETURNING id, user_id, provider, provider_account_id, access_token, refresh_token, expires_at, scope, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(&input.provider)
        .bind(&input.provider_account_id)
        .bind(&input.access_token)
        .bind(&input.refresh_token)
        .bind(input.expires_at)
        .bind(&input.scope)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Most recently updated account of a user for a provider
    pub async fn get_account(&self, user_id: Uuid, provider: &str) -> Result<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, user_id, provider, provider_account_id, access_token, refresh_token, expires_at, scope, created_at, updated_at
            FROM accounts
            WHERE user_id = $1 AND provider = $2
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Meetings
    // ============================================

    pub async fn upsert_meeting(&self, input: UpsertMeeting) -> Result<MeetingRow> {
        let row = sqlx::query_as::<_, MeetingRow>(
            r#"
            INSERT INTO meetings (id, google_id, title, description, start_time, end_time, attendees, location, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (google_id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                attendees = EXCLUDED.attendees,
                location = EXCLUDED.location,
                updated_at = NOW()
            RETURNING id, google_id, title, description, start_time, end_time, attendees, location, user_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.google_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(&input.attendees)
        .bind(&input.location)
        .bind(input.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_meeting_by_google_id(&self, google_id: &str) -> Result<Option<MeetingRow>> {
        let row = sqlx::query_as::<_, MeetingRow>(
            r#"
            SELECT id, google_id, title, description, start_time, end_time, attendees, location, user_id, created_at, updated_at
            FROM meetings
            WHERE google_id = $1
            "#,
        )
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Summaries
    // ============================================

    pub async fn get_summary(&self, meeting_id: Uuid) -> Result<Option<SummaryRow>> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id, meeting_id, content, created_at
            FROM summaries
            WHERE meeting_id = $1
            "#,
        )
        .bind(meeting_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Insert a summary unless the meeting already has one; returns the stored row
    pub async fn create_summary(&self, meeting_id: Uuid, content: &str) -> Result<SummaryRow> {
        let inserted = sqlx::query_as::<_, SummaryRow>(
            r#"
            INSERT INTO summaries (id, meeting_id, content)
            VALUES ($1, $2, $3)
            ON CONFLICT (meeting_id) DO NOTHING
            RETURNING id, meeting_id, content, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(meeting_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row);
        }

        tracing::debug!(%meeting_id, "Summary already exists, keeping stored one");
        self.get_summary(meeting_id)
            .await?
            .context("Summary conflict but no stored summary found")
    }
}
