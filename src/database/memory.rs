use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChallengeStore, QuotaStore, Store};
use crate::errors::Result;
use crate::models::{ChallengeRecord, NewChallenge, QuotaRecord, QuotaRefill};

/// Process-local store for tests and `DATABASE_URL=memory://` runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    quotas: HashMap<String, QuotaRecord>,
    challenges: Vec<ChallengeRecord>,
    next_quota_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn challenge_count(&self) -> usize {
        self.inner.read().await.challenges.len()
    }
}

#[async_trait]
impl QuotaStore for MemoryStore {
    async fn find_quota(&self, user_id: &str) -> Result<Option<QuotaRecord>> {
        Ok(self.inner.read().await.quotas.get(user_id).cloned())
    }

    async fn create_quota(
        &self,
        user_id: &str,
        quota_remaining: i32,
        now: DateTime<Utc>,
    ) -> Result<QuotaRecord> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.quotas.get(user_id) {
            return Ok(existing.clone());
        }

        inner.next_quota_id += 1;
        let quota = QuotaRecord {
            id: inner.next_quota_id,
            user_id: user_id.to_string(),
            quota_remaining,
            last_reset_date: Some(now),
        };
        inner.quotas.insert(user_id.to_string(), quota.clone());

        Ok(quota)
    }

    async fn apply_refill(&self, refill: &QuotaRefill) -> Result<Option<QuotaRecord>> {
        let mut inner = self.inner.write().await;
        match inner.quotas.get_mut(&refill.user_id) {
            Some(quota) if quota.last_reset_date == refill.previous_reset => {
                let topped_up = (quota.quota_remaining + refill.added).min(refill.max_quota);
                quota.quota_remaining = quota.quota_remaining.max(topped_up);
                quota.last_reset_date = refill.next_reset;
                Ok(Some(quota.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn consume_quota(&self, user_id: &str) -> Result<Option<QuotaRecord>> {
        let mut inner = self.inner.write().await;
        match inner.quotas.get_mut(user_id) {
            Some(quota) if quota.quota_remaining > 0 => {
                quota.quota_remaining -= 1;
                Ok(Some(quota.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn create_challenge(
        &self,
        challenge: NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<ChallengeRecord> {
        let record = ChallengeRecord {
            id: Uuid::new_v4(),
            difficulty: challenge.difficulty,
            created_by: challenge.created_by,
            title: challenge.title,
            options: challenge.options,
            correct_answer_id: challenge.correct_answer_id,
            explanation: challenge.explanation,
            date_created: now,
        };

        self.inner.write().await.challenges.push(record.clone());
        Ok(record)
    }

    async fn list_challenges_by_creator(&self, created_by: &str) -> Result<Vec<ChallengeRecord>> {
        let inner = self.inner.read().await;
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut challenges: Vec<ChallengeRecord> = inner
            .challenges
            .iter()
            .rev()
            .filter(|challenge| challenge.created_by == created_by)
            .cloned()
            .collect();
        challenges.sort_by(|a, b| b.date_created.cmp(&a.date_created));

        Ok(challenges)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_challenge(created_by: &str, title: &str) -> NewChallenge {
        NewChallenge {
            difficulty: "medium".to_string(),
            created_by: created_by.to_string(),
            title: title.to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer_id: 1,
            explanation: "b is right".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_quota_is_idempotent() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let first = store.create_quota("user_1", 5, now).await.unwrap();
        store.consume_quota("user_1").await.unwrap();
        let second = store.create_quota("user_1", 5, now).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quota_remaining, 4);
    }

    #[tokio::test]
    async fn test_consume_never_goes_negative() {
        let store = MemoryStore::new();
        store.create_quota("user_1", 1, Utc::now()).await.unwrap();

        assert_eq!(store.consume_quota("user_1").await.unwrap().unwrap().quota_remaining, 0);
        assert!(store.consume_quota("user_1").await.unwrap().is_none());
        assert!(store.consume_quota("nobody").await.unwrap().is_none());
    }

    fn refill(previous_reset: DateTime<Utc>, added: i32) -> QuotaRefill {
        QuotaRefill {
            user_id: "user_1".to_string(),
            previous_reset: Some(previous_reset),
            next_reset: Some(previous_reset + Duration::hours(2)),
            added,
            max_quota: 5,
        }
    }

    #[tokio::test]
    async fn test_refill_adds_to_current_value() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        store.create_quota("user_1", 2, t0).await.unwrap();
        store.consume_quota("user_1").await.unwrap();

        let quota = store.apply_refill(&refill(t0, 1)).await.unwrap().unwrap();

        assert_eq!(quota.quota_remaining, 2);
        assert_eq!(quota.last_reset_date, Some(t0 + Duration::hours(2)));
    }

    #[tokio::test]
    async fn test_refill_capped_and_never_lowers() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        store.create_quota("user_1", 4, t0).await.unwrap();
        let quota = store.apply_refill(&refill(t0, 3)).await.unwrap().unwrap();
        assert_eq!(quota.quota_remaining, 5);

        store.create_quota("user_2", 7, t0).await.unwrap();
        let over = QuotaRefill {
            user_id: "user_2".to_string(),
            ..refill(t0, 0)
        };
        assert_eq!(store.apply_refill(&over).await.unwrap().unwrap().quota_remaining, 7);
    }

    #[tokio::test]
    async fn test_stale_refill_is_skipped() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        store.create_quota("user_1", 1, t0).await.unwrap();

        assert!(store.apply_refill(&refill(t0, 1)).await.unwrap().is_some());
        assert!(store.apply_refill(&refill(t0, 1)).await.unwrap().is_none());
        assert!(store.apply_refill(&QuotaRefill {
            user_id: "nobody".to_string(),
            ..refill(t0, 1)
        })
        .await
        .unwrap()
        .is_none());

        assert_eq!(store.find_quota("user_1").await.unwrap().unwrap().quota_remaining, 2);
    }

    #[tokio::test]
    async fn test_history_is_per_user_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store.create_challenge(new_challenge("alice", "old"), now).await.unwrap();
        store.create_challenge(new_challenge("bob", "bob's"), now).await.unwrap();
        store
            .create_challenge(new_challenge("alice", "new"), now + Duration::minutes(1))
            .await
            .unwrap();

        let titles: Vec<String> = store
            .list_challenges_by_creator("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();

        assert_eq!(titles, vec!["new", "old"]);
        assert_eq!(store.challenge_count().await, 3);
    }
}
