use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    database::Store,
    services::{
        ai_generator::ChallengeGenerator, challenge_service::ChallengeService, clock::Clock,
        metrics::MetricsService, quota_manager::QuotaManager,
    },
};

pub mod challenge;
pub mod docs;
pub mod health;
pub mod metrics;
pub mod quota;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: Arc<JwtService>,
    pub store: Arc<dyn Store>,
    pub quotas: Arc<QuotaManager>,
    pub challenges: Arc<ChallengeService>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        generator: Arc<dyn ChallengeGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let metrics = Arc::new(MetricsService::new());
        let quotas = Arc::new(QuotaManager::new(
            store.clone(),
            config.quota_policy(),
            clock.clone(),
        ));
        let challenges = Arc::new(ChallengeService::new(
            store.clone(),
            generator,
            quotas.clone(),
            clock,
            metrics.clone(),
        ));

        Self {
            jwt: Arc::new(JwtService::new(&config.jwt_secret)),
            config: Arc::new(config),
            store,
            quotas,
            challenges,
            metrics,
        }
    }
}
