use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub id: i64,
    pub user_id: String,
    pub quota_remaining: i32,
    pub last_reset_date: Option<DateTime<Utc>>,
}

/// A refill computed from a snapshot of a quota row.
///
/// It applies only while the row still carries `previous_reset`. `added` goes on
/// top of the current value, capped at `max_quota`, so decrements made after
/// the snapshot are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaRefill {
    pub user_id: String,
    pub previous_reset: Option<DateTime<Utc>>,
    pub next_reset: Option<DateTime<Utc>>,
    pub added: i32,
    pub max_quota: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuotaResponse {
    pub user_id: String,
    pub quota_remaining: i32,
    pub last_reset_date: Option<DateTime<Utc>>,
}

impl QuotaResponse {
    /// Returned for users that never generated anything; nothing is stored.
    pub fn placeholder(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            quota_remaining: 0,
            last_reset_date: Some(now),
        }
    }
}

impl From<QuotaRecord> for QuotaResponse {
    fn from(record: QuotaRecord) -> Self {
        Self {
            user_id: record.user_id,
            quota_remaining: record.quota_remaining,
            last_reset_date: record.last_reset_date,
        }
    }
}
