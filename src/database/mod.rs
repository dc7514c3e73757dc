use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::errors::Result;
use crate::models::{ChallengeRecord, NewChallenge, QuotaRecord, QuotaRefill};

pub mod memory;
pub mod queries;

pub use memory::MemoryStore;
use queries::{ChallengeQueries, QuotaQueries};

#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn find_quota(&self, user_id: &str) -> Result<Option<QuotaRecord>>;

    async fn create_quota(
        &self,
        user_id: &str,
        quota_remaining: i32,
        now: DateTime<Utc>,
    ) -> Result<QuotaRecord>;

    /// Applies a refill unless the row's timestamp moved since the snapshot.
    /// `None` means another request got there first and nothing was written.
    async fn apply_refill(&self, refill: &QuotaRefill) -> Result<Option<QuotaRecord>>;

    /// Decrements by one if anything is left. `None` means nothing was taken.
    async fn consume_quota(&self, user_id: &str) -> Result<Option<QuotaRecord>>;
}

#[async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn create_challenge(
        &self,
        challenge: NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<ChallengeRecord>;

    /// All challenges of one creator, newest first.
    async fn list_challenges_by_creator(&self, created_by: &str) -> Result<Vec<ChallengeRecord>>;
}

#[async_trait]
pub trait Store: QuotaStore + ChallengeStore {
    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QuotaStore for Database {
    async fn find_quota(&self, user_id: &str) -> Result<Option<QuotaRecord>> {
        QuotaQueries::find_by_user(&self.pool, user_id).await
    }

    async fn create_quota(
        &self,
        user_id: &str,
        quota_remaining: i32,
        now: DateTime<Utc>,
    ) -> Result<QuotaRecord> {
        QuotaQueries::create(&self.pool, user_id, quota_remaining, now).await
    }

    async fn apply_refill(&self, refill: &QuotaRefill) -> Result<Option<QuotaRecord>> {
        QuotaQueries::apply_refill(&self.pool, refill).await
    }

    async fn consume_quota(&self, user_id: &str) -> Result<Option<QuotaRecord>> {
        QuotaQueries::consume_one(&self.pool, user_id).await
    }
}

#[async_trait]
impl ChallengeStore for Database {
    async fn create_challenge(
        &self,
        challenge: NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<ChallengeRecord> {
        ChallengeQueries::create(&self.pool, &challenge, now).await
    }

    async fn list_challenges_by_creator(&self, created_by: &str) -> Result<Vec<ChallengeRecord>> {
        ChallengeQueries::list_by_creator(&self.pool, created_by).await
    }
}

#[async_trait]
impl Store for Database {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
