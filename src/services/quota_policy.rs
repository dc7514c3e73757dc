//! Step-wise quota refill.
//!
//! One unit of quota comes back per full refill interval elapsed since
//! `last_reset_date`, capped at `max_quota`. The timestamp moves forward by
//! whole intervals only, so partial progress toward the next unit is kept.

use chrono::{DateTime, Duration, Utc};

use crate::models::QuotaRecord;

pub const DEFAULT_MAX_QUOTA: i32 = 5;
pub const DEFAULT_REFILL_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub max_quota: i32,
    pub refill_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillOutcome {
    /// Nothing to do; the record was not touched.
    Unchanged,
    /// `last_reset_date` was missing and has been set to now.
    Initialized,
    /// Quota went up by `added` after `steps` full intervals.
    Refilled { steps: i64, added: i32 },
    /// Quota was already full; only the timestamp moved.
    Advanced { steps: i64 },
}

impl RefillOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, RefillOutcome::Unchanged)
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUOTA, Duration::hours(DEFAULT_REFILL_HOURS))
    }
}

impl QuotaPolicy {
    pub fn new(max_quota: i32, refill_interval: Duration) -> Self {
        Self {
            max_quota,
            refill_interval,
        }
    }

    /// Number of whole refill intervals between `last_reset` and `now`.
    pub fn refill_steps(&self, last_reset: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let interval_ms = self.refill_interval.num_milliseconds();
        if interval_ms <= 0 {
            return 0;
        }

        let elapsed_ms = (now - last_reset).num_milliseconds();
        if elapsed_ms <= 0 {
            return 0;
        }

        elapsed_ms / interval_ms
    }

    /// Applies any due refill to `record` in place.
    ///
    /// When the quota is already full the timestamp still advances by the
    /// elapsed whole intervals.
    pub fn apply(&self, record: &mut QuotaRecord, now: DateTime<Utc>) -> RefillOutcome {
        let Some(last_reset) = record.last_reset_date else {
            record.last_reset_date = Some(now);
            return RefillOutcome::Initialized;
        };

        let steps = self.refill_steps(last_reset, now);
        if steps < 1 {
            return RefillOutcome::Unchanged;
        }

        let advanced = last_reset + Duration::milliseconds(steps * self.refill_interval.num_milliseconds());
        record.last_reset_date = Some(advanced);

        if record.quota_remaining >= self.max_quota {
            return RefillOutcome::Advanced { steps };
        }

        let before = record.quota_remaining;
        let refilled = (i64::from(before) + steps).min(i64::from(self.max_quota));
        record.quota_remaining = refilled as i32;

        RefillOutcome::Refilled {
            steps,
            added: record.quota_remaining - before,
        }
    }
}
