use std::sync::Arc;

use crate::{
    database::{ChallengeStore, Store},
    errors::{AppError, Result},
    models::{ChallengeResponse, HistoryResponse, NewChallenge},
    services::{
        ai_generator::ChallengeGenerator, clock::Clock, metrics::MetricsService,
        quota_manager::QuotaManager,
    },
};

/// Runs a generation request end to end: quota, provider call, persistence.
pub struct ChallengeService {
    store: Arc<dyn Store>,
    generator: Arc<dyn ChallengeGenerator>,
    quotas: Arc<QuotaManager>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsService>,
}

impl ChallengeService {
    pub fn new(
        store: Arc<dyn Store>,
        generator: Arc<dyn ChallengeGenerator>,
        quotas: Arc<QuotaManager>,
        clock: Arc<dyn Clock>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            store,
            generator,
            quotas,
            clock,
            metrics,
        }
    }

    pub async fn generate(&self, user_id: &str, difficulty: &str) -> Result<ChallengeResponse> {
        let quota = self.quotas.load_or_create(user_id).await?;
        if quota.quota_remaining <= 0 {
            tracing::info!(user_id, "challenge quota exhausted");
            self.metrics.record_quota_rejection();
            return Err(AppError::QuotaExhausted);
        }

        let draft = match self.generator.generate(difficulty).await {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(user_id, difficulty, kind = e.kind(), "challenge generation failed");
                self.metrics.record_generation_failure(e.kind());
                return Err(e.into());
            }
        };

        let challenge = self
            .store
            .create_challenge(
                NewChallenge {
                    difficulty: difficulty.to_string(),
                    created_by: user_id.to_string(),
                    title: draft.title,
                    options: draft.options,
                    correct_answer_id: draft.correct_answer_id,
                    explanation: draft.explanation,
                },
                self.clock.now(),
            )
            .await?;

        // Challenge and decrement are not atomic together; a concurrent
        // request may have taken the last unit in between.
        match self.quotas.consume(user_id).await? {
            Some(quota) => tracing::info!(
                user_id,
                challenge_id = %challenge.id,
                quota_remaining = quota.quota_remaining,
                "challenge generated"
            ),
            None => tracing::warn!(
                user_id,
                challenge_id = %challenge.id,
                "quota drained concurrently; challenge delivered without decrement"
            ),
        }
        self.metrics.record_generation();

        Ok(ChallengeResponse::with_code(challenge, draft.code))
    }

    pub async fn history(&self, user_id: &str) -> Result<HistoryResponse> {
        let challenges = self
            .store
            .list_challenges_by_creator(user_id)
            .await?
            .into_iter()
            .map(ChallengeResponse::from)
            .collect();

        Ok(HistoryResponse { challenges })
    }
}
