use std::sync::Arc;

use crate::{
    database::{QuotaStore, Store},
    errors::Result,
    models::{QuotaRecord, QuotaRefill, QuotaResponse},
    services::{
        clock::Clock,
        quota_policy::{QuotaPolicy, RefillOutcome},
    },
};

pub struct QuotaManager {
    store: Arc<dyn Store>,
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
}

impl QuotaManager {
    pub fn new(store: Arc<dyn Store>, policy: QuotaPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Loads the caller's quota, creating a full one on first use, and applies
    /// any refill that is due.
    pub async fn load_or_create(&self, user_id: &str) -> Result<QuotaRecord> {
        let quota = match self.store.find_quota(user_id).await? {
            Some(quota) => quota,
            None => {
                tracing::info!(user_id, max_quota = self.policy.max_quota, "creating challenge quota");
                self.store
                    .create_quota(user_id, self.policy.max_quota, self.clock.now())
                    .await?
            }
        };

        self.refresh(quota).await
    }

    /// Applies any due refill to a snapshot and writes it back.
    ///
    /// The write is conditional on the snapshot's timestamp and adds units to
    /// the stored value, so a concurrent `consume` is not undone and a refill is
    /// never credited twice.
    pub async fn refresh(&self, quota: QuotaRecord) -> Result<QuotaRecord> {
        let mut refilled = quota.clone();
        let outcome = self.policy.apply(&mut refilled, self.clock.now());
        if !outcome.changed() {
            return Ok(quota);
        }

        let added = match outcome {
            RefillOutcome::Refilled { steps, added } => {
                tracing::debug!(user_id = %quota.user_id, steps, added, "quota refilled");
                added
            }
            _ => 0,
        };

        let refill = QuotaRefill {
            user_id: quota.user_id.clone(),
            previous_reset: quota.last_reset_date,
            next_reset: refilled.last_reset_date,
            added,
            max_quota: self.policy.max_quota,
        };

        match self.store.apply_refill(&refill).await? {
            Some(stored) => Ok(stored),
            None => {
                tracing::debug!(user_id = %quota.user_id, "refill raced with another request");
                Ok(self.store.find_quota(&quota.user_id).await?.unwrap_or(refilled))
            }
        }
    }

    /// Read-only view for the quota endpoint. Unknown users get a zero
    /// placeholder that is not stored.
    pub async fn current(&self, user_id: &str) -> Result<QuotaResponse> {
        match self.store.find_quota(user_id).await? {
            Some(quota) => Ok(self.refresh(quota).await?.into()),
            None => Ok(QuotaResponse::placeholder(user_id, self.clock.now())),
        }
    }

    /// Takes one unit. `None` when the quota was already empty.
    pub async fn consume(&self, user_id: &str) -> Result<Option<QuotaRecord>> {
        self.store.consume_quota(user_id).await
    }
}
