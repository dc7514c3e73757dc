pub mod ai_generator;
pub mod challenge_service;
pub mod clock;
pub mod metrics;
pub mod quota_manager;
pub mod quota_policy;

pub use ai_generator::*;
pub use challenge_service::*;
pub use clock::*;
pub use metrics::*;
pub use quota_manager::*;
pub use quota_policy::*;
