use anyhow::{ensure, Result};
use std::env;

use crate::services::quota_policy::QuotaPolicy;

/// Prefix of a `DATABASE_URL` that selects the in-process store instead of Postgres.
pub const IN_MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_quota: i32,
    pub quota_refill_hours: u32,
    pub ai: AiConfig,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Human language the questions, options and explanations are written in.
    pub target_language: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
            target_language: "neutral Spanish".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = AiConfig::default();

        let config = Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/quiz_challenges".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_quota: env::var("MAX_QUOTA")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            quota_refill_hours: env::var("QUOTA_REFILL_HOURS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,
            ai: AiConfig {
                api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
                model: env::var("OPENAI_MODEL").unwrap_or(defaults.model),
                temperature: match env::var("OPENAI_TEMPERATURE") {
                    Ok(value) => value.parse()?,
                    Err(_) => defaults.temperature,
                },
                timeout_secs: match env::var("OPENAI_TIMEOUT_SECS") {
                    Ok(value) => value.parse()?,
                    Err(_) => defaults.timeout_secs,
                },
                target_language: env::var("CHALLENGE_LANGUAGE")
                    .unwrap_or(defaults.target_language),
            },
        };

        ensure!(config.max_quota >= 1, "MAX_QUOTA must be at least 1");
        ensure!(config.quota_refill_hours >= 1, "QUOTA_REFILL_HOURS must be at least 1");

        Ok(config)
    }

    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy::new(self.max_quota, chrono::Duration::hours(self.quota_refill_hours.into()))
    }

    pub fn uses_in_memory_store(&self) -> bool {
        self.database_url.starts_with(IN_MEMORY_DATABASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "DATABASE_URL",
        "PORT",
        "MAX_QUOTA",
        "QUOTA_REFILL_HOURS",
        "OPENAI_MODEL",
        "OPENAI_TEMPERATURE",
        "CORS_ALLOWED_ORIGINS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.max_quota, 5);
        assert_eq!(config.quota_refill_hours, 2);
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173"]);
        assert!(!config.uses_in_memory_store());

        let policy = config.quota_policy();
        assert_eq!(policy.max_quota, 5);
        assert_eq!(policy.refill_interval, chrono::Duration::hours(2));
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        env::set_var("DATABASE_URL", "memory://");
        env::set_var("MAX_QUOTA", "10");
        env::set_var("OPENAI_TEMPERATURE", "0.2");
        env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");

        let config = Config::from_env().unwrap();
        clear_env();

        assert!(config.uses_in_memory_store());
        assert_eq!(config.max_quota, 10);
        assert!((config.ai.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.cors_allowed_origins.len(), 2);
    }

    #[test]
    #[serial]
    fn test_rejects_zero_quota() {
        clear_env();
        env::set_var("MAX_QUOTA", "0");
        let result = Config::from_env();
        clear_env();

        assert!(result.is_err());
    }
}
