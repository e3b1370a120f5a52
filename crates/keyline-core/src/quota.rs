// ── Daily quota reset ──
//
// Every call re-derives the user's state from stored fields and fires at
// most one branch, in order: expiry, then daily reset, then no-op.
//
// Writes are best-effort. A failed write is logged and reported through
// `persisted`, but the caller still receives the derived state.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use keyline_api::{DocumentStore, Fields, Value};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::CoreError;
use crate::model::{
    DEFAULT_PAID_LIMIT, FREE_MESSAGES_LIMIT, Plan, USERS, UserRecord, field,
};

/// What a reset call decided. The write flag never changes the reported
/// counters; it only says whether the store accepted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ResetOutcome {
    /// License lapsed; user reverted to the free tier.
    Expired {
        plan: Plan,
        messages_limit: i64,
        messages_used: i64,
        persisted: bool,
    },
    /// First call on a new calendar day for a paid user.
    DailyReset {
        messages_used: i64,
        messages_limit: i64,
        persisted: bool,
    },
    NoOp,
}

impl ResetOutcome {
    /// Human-readable summary returned alongside the counters.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Expired { .. } => "License expired, reverted to Free",
            Self::DailyReset { .. } => "Messages reset for today",
            Self::NoOp => "No reset needed",
        }
    }

    /// `false` only when a branch tried to write and the store refused.
    pub fn persisted(&self) -> bool {
        match self {
            Self::Expired { persisted, .. } | Self::DailyReset { persisted, .. } => *persisted,
            Self::NoOp => true,
        }
    }
}

#[derive(Clone)]
pub struct QuotaService {
    store: Arc<dyn DocumentStore>,
    offset: FixedOffset,
}

impl QuotaService {
    /// Calendar days are evaluated in UTC.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            offset: Utc.fix(),
        }
    }

    /// Evaluate calendar days in `offset` instead of UTC.
    #[must_use]
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub async fn reset_if_needed(&self, user_id: &str) -> Result<ResetOutcome, CoreError> {
        self.reset_if_needed_at(user_id, Utc::now()).await
    }

    pub async fn reset_if_needed_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome, CoreError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(CoreError::validation("User ID is required"));
        }

        let doc = self.store.get(USERS, user_id).await.map_err(|e| {
            error!(error = %e, user_id, "user lookup failed");
            CoreError::from(e)
        })?;
        let Some(doc) = doc else {
            return Err(CoreError::not_found("User not found"));
        };
        let Some(user) = UserRecord::from_document(&doc) else {
            return Err(CoreError::not_found("Invalid user"));
        };

        let now_ms = now.timestamp_millis();

        if user.license_expires_at.is_some_and(|at| at <= now_ms) {
            let fields = Fields::new()
                .with(field::PLAN, Plan::Free.as_str())
                .with(field::MESSAGES_LIMIT, FREE_MESSAGES_LIMIT)
                .with(field::MESSAGES_USED, 0_i64)
                .with(field::LICENSE_KEY, "")
                .with(field::LICENSE_EXPIRES_AT, Value::Null);
            let persisted = self.write(user_id, fields, "expired license").await;
            info!(user_id, persisted, "license expired, reverted to Free");
            return Ok(ResetOutcome::Expired {
                plan: Plan::Free,
                messages_limit: FREE_MESSAGES_LIMIT,
                messages_used: 0,
                persisted,
            });
        }

        let new_day = user.on_paid_plan()
            && user
                .last_message_reset
                .is_some_and(|last| self.calendar_day(last) != self.calendar_day(now_ms));
        if new_day {
            let fields = Fields::new()
                .with(field::MESSAGES_USED, 0_i64)
                .with(field::LAST_MESSAGE_RESET, now_ms);
            let persisted = self.write(user_id, fields, "daily reset").await;
            let messages_limit = user
                .messages_limit
                .filter(|limit| *limit != 0)
                .unwrap_or(DEFAULT_PAID_LIMIT);
            info!(user_id, persisted, messages_limit, "daily message counter reset");
            return Ok(ResetOutcome::DailyReset {
                messages_used: 0,
                messages_limit,
                persisted,
            });
        }

        debug!(user_id, "no reset needed");
        Ok(ResetOutcome::NoOp)
    }

    /// Local date of an epoch-ms instant. `None` for out-of-range values,
    /// which never equal a real date and so always trigger a reset.
    fn calendar_day(&self, epoch_ms: i64) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(epoch_ms)
            .map(|t| t.with_timezone(&self.offset).date_naive())
    }

    async fn write(&self, user_id: &str, fields: Fields, what: &str) -> bool {
        match self.store.patch(USERS, user_id, fields).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, user_id, "{what} write failed; reporting derived state anyway");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use keyline_api::MemoryStore;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn offset_moves_the_day_boundary() {
        let store = Arc::new(MemoryStore::new());
        // 23:00 UTC on the 1st is already the 2nd at +02:00.
        let last = at(2025, 3, 1, 21).timestamp_millis();
        store.seed(
            "users",
            "u1",
            Fields::new().with("plan", "Pro").with("lastMessageReset", last),
        );
        let now = at(2025, 3, 1, 23);

        let utc = QuotaService::new(store.clone());
        assert_eq!(utc.reset_if_needed_at("u1", now).await.unwrap(), ResetOutcome::NoOp);

        let plus_two = QuotaService::new(store.clone())
            .with_utc_offset(FixedOffset::east_opt(2 * 3600).unwrap());
        let outcome = plus_two.reset_if_needed_at("u1", now).await.unwrap();
        assert!(matches!(outcome, ResetOutcome::DailyReset { .. }));
    }

    #[tokio::test]
    async fn zero_limit_reports_default_paid_limit() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "users",
            "u1",
            Fields::new()
                .with("plan", "Classic")
                .with("messagesLimit", 0_i64)
                .with("lastMessageReset", at(2025, 1, 1, 8).timestamp_millis()),
        );
        let outcome = QuotaService::new(store)
            .reset_if_needed_at("u1", at(2025, 1, 2, 8))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ResetOutcome::DailyReset {
                messages_used: 0,
                messages_limit: 500,
                persisted: true,
            }
        );
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(ResetOutcome::DailyReset {
            messages_used: 0,
            messages_limit: 500,
            persisted: true,
        })
        .unwrap();
        assert_eq!(json["outcome"], "dailyReset");
        assert_eq!(json["messagesLimit"], 500);
    }
}
