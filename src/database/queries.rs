use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::*;

pub struct QuotaQueries;

impl QuotaQueries {
    pub async fn find_by_user(pool: &PgPool, user_id: &str) -> Result<Option<QuotaRecord>> {
        let quota = sqlx::query_as::<_, QuotaRecord>(
            "SELECT id, user_id, quota_remaining, last_reset_date FROM challenge_quota WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(quota)
    }

    /// Inserts a fresh quota row. A row created concurrently for the same
    /// user wins and is returned untouched.
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        quota_remaining: i32,
        now: DateTime<Utc>,
    ) -> Result<QuotaRecord> {
        let quota = sqlx::query_as::<_, QuotaRecord>(
            r#"
            INSERT INTO challenge_quota (user_id, quota_remaining, last_reset_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, quota_remaining, last_reset_date
            "#,
        )
        .bind(user_id)
        .bind(quota_remaining)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(quota)
    }

    /// Compare-and-set on `last_reset_date`. Units are added to the stored
    /// value and never push it down.
    pub async fn apply_refill(pool: &PgPool, refill: &QuotaRefill) -> Result<Option<QuotaRecord>> {
        let quota = sqlx::query_as::<_, QuotaRecord>(
            r#"
            UPDATE challenge_quota
            SET quota_remaining = GREATEST(quota_remaining, LEAST($1, quota_remaining + $2)),
                last_reset_date = $3
            WHERE user_id = $4 AND last_reset_date IS NOT DISTINCT FROM $5
            RETURNING id, user_id, quota_remaining, last_reset_date
            "#,
        )
        .bind(refill.max_quota)
        .bind(refill.added)
        .bind(refill.next_reset)
        .bind(&refill.user_id)
        .bind(refill.previous_reset)
        .fetch_optional(pool)
        .await?;

        Ok(quota)
    }

    /// Takes one unit only if one is left, in a single statement.
    pub async fn consume_one(pool: &PgPool, user_id: &str) -> Result<Option<QuotaRecord>> {
        let quota = sqlx::query_as::<_, QuotaRecord>(
            r#"
            UPDATE challenge_quota
            SET quota_remaining = quota_remaining - 1
            WHERE user_id = $1 AND quota_remaining > 0
            RETURNING id, user_id, quota_remaining, last_reset_date
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(quota)
    }
}

pub struct ChallengeQueries;

impl ChallengeQueries {
    pub async fn create(pool: &PgPool, challenge: &NewChallenge, now: DateTime<Utc>) -> Result<ChallengeRecord> {
        let options = serde_json::to_string(&challenge.options)
            .context("Failed to serialize challenge options")?;

        let row = sqlx::query_as::<_, ChallengeRow>(
            r#"
            INSERT INTO challenge (id, difficulty, created_by, title, options, correct_answer_id, explanation, date_created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, difficulty, created_by, title, options, correct_answer_id, explanation, date_created
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&challenge.difficulty)
        .bind(&challenge.created_by)
        .bind(&challenge.title)
        .bind(options)
        .bind(challenge.correct_answer_id)
        .bind(&challenge.explanation)
        .bind(now)
        .fetch_one(pool)
        .await?;

        decode_row(row)
    }

    pub async fn list_by_creator(pool: &PgPool, created_by: &str) -> Result<Vec<ChallengeRecord>> {
        let rows = sqlx::query_as::<_, ChallengeRow>(
            r#"
            SELECT id, difficulty, created_by, title, options, correct_answer_id, explanation, date_created
            FROM challenge
            WHERE created_by = $1
            ORDER BY date_created DESC
            "#,
        )
        .bind(created_by)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(decode_row).collect()
    }
}

fn decode_row(row: ChallengeRow) -> Result<ChallengeRecord> {
    let id = row.id;
    ChallengeRecord::try_from(row)
        .with_context(|| format!("Stored options of challenge {} are not a JSON array", id))
        .map_err(AppError::Internal)
}
