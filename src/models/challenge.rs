use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A persisted quiz. The code snippet shown alongside it is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub id: Uuid,
    pub difficulty: String,
    pub created_by: String,
    pub title: String,
    pub options: Vec<String>,
    pub correct_answer_id: i32,
    pub explanation: String,
    pub date_created: DateTime<Utc>,
}

/// Row shape of the `challenge` table; `options` is JSON text.
#[derive(Debug, Clone, FromRow)]
pub struct ChallengeRow {
    pub id: Uuid,
    pub difficulty: String,
    pub created_by: String,
    pub title: String,
    pub options: String,
    pub correct_answer_id: i32,
    pub explanation: String,
    pub date_created: DateTime<Utc>,
}

impl TryFrom<ChallengeRow> for ChallengeRecord {
    type Error = serde_json::Error;

    fn try_from(row: ChallengeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            difficulty: row.difficulty,
            created_by: row.created_by,
            title: row.title,
            options: serde_json::from_str(&row.options)?,
            correct_answer_id: row.correct_answer_id,
            explanation: row.explanation,
            date_created: row.date_created,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChallenge {
    pub difficulty: String,
    pub created_by: String,
    pub title: String,
    pub options: Vec<String>,
    pub correct_answer_id: i32,
    pub explanation: String,
}

/// Structured quiz produced by the completion provider, before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeDraft {
    pub title: String,
    pub code: String,
    pub options: Vec<String>,
    pub correct_answer_id: i32,
    pub explanation: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateChallengeRequest {
    #[schema(example = "easy")]
    pub difficulty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
    pub id: Uuid,
    pub difficulty: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub options: Vec<String>,
    pub correct_answer_id: i32,
    pub explanation: String,
    pub timestamp: DateTime<Utc>,
}

impl ChallengeResponse {
    pub fn with_code(record: ChallengeRecord, code: String) -> Self {
        Self {
            code: Some(code),
            ..Self::from(record)
        }
    }
}

impl From<ChallengeRecord> for ChallengeResponse {
    fn from(record: ChallengeRecord) -> Self {
        Self {
            id: record.id,
            difficulty: record.difficulty,
            title: record.title,
            code: None,
            options: record.options,
            correct_answer_id: record.correct_answer_id,
            explanation: record.explanation,
            timestamp: record.date_created,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub challenges: Vec<ChallengeResponse>,
}
