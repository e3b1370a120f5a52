// ── License issuance and administration ──
//
// Keys are `LICENSE-{epoch_ms}-{SUFFIX}`. Uniqueness is probabilistic: the
// store has no uniqueness constraint and `generate` overwrites any
// document already at the key.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use keyline_api::{DocumentStore, Fields, Value};
use rand::Rng;
use tracing::{debug, error, info};

use crate::error::CoreError;
use crate::model::{LICENSES, LicenseRecord, Plan, field};

pub const KEY_PREFIX: &str = "LICENSE";
pub const SUFFIX_LEN: usize = 9;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Build a license key for instant `now_ms` with a fresh random suffix.
pub fn generate_key(now_ms: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect();
    format!("{KEY_PREFIX}-{now_ms}-{suffix}")
}

/// Shorten a key for logs: prefix and timestamp only.
pub(crate) fn redact(key: &str) -> &str {
    key.rsplit_once('-').map_or(key, |(head, _)| head)
}

/// Issues, lists and administers license records.
#[derive(Clone)]
pub struct LicenseService {
    store: Arc<dyn DocumentStore>,
}

impl LicenseService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Issue a license and return its key.
    pub async fn generate(
        &self,
        plan: Plan,
        issuer_id: &str,
        validity_days: i64,
    ) -> Result<String, CoreError> {
        let record = self.issue_at(plan, issuer_id, validity_days, Utc::now()).await?;
        Ok(record.key)
    }

    /// Issue a license stamped with `now` and return the stored record.
    pub async fn issue_at(
        &self,
        plan: Plan,
        issuer_id: &str,
        validity_days: i64,
        now: DateTime<Utc>,
    ) -> Result<LicenseRecord, CoreError> {
        let issuer = issuer_id.trim();
        if issuer.is_empty() {
            return Err(CoreError::validation("Issuer ID is required"));
        }
        if validity_days < 1 {
            return Err(CoreError::validation(
                "Validity must be at least one day",
            ));
        }

        let now_ms = now.timestamp_millis();
        if LicenseRecord::expiry(now_ms, validity_days).is_none() {
            return Err(CoreError::validation("Validity is too large"));
        }
        let record = LicenseRecord::issue(plan, issuer, validity_days, now_ms, generate_key(now_ms));

        self.store
            .set(LICENSES, &record.key, record.to_fields())
            .await
            .map_err(|e| {
                error!(error = %e, "failed to store new license");
                CoreError::from(e)
            })?;

        info!(
            key = redact(&record.key),
            %plan,
            issuer,
            validity_days,
            "license issued"
        );
        Ok(record)
    }

    /// Every license created by `issuer_id`, newest first.
    pub async fn list_by_issuer(&self, issuer_id: &str) -> Result<Vec<LicenseRecord>, CoreError> {
        let issuer = issuer_id.trim();
        if issuer.is_empty() {
            return Err(CoreError::validation("Issuer ID is required"));
        }

        let docs = self
            .store
            .query_eq(LICENSES, field::CREATED_BY, Value::from(issuer))
            .await
            .map_err(|e| {
                error!(error = %e, issuer, "license listing failed");
                CoreError::from(e)
            })?;

        let mut records: Vec<LicenseRecord> =
            docs.iter().filter_map(LicenseRecord::from_document).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!(issuer, count = records.len(), "licenses listed");
        Ok(records)
    }

    /// Soft-disable a license. Writes both `active` and `isActive` so the
    /// issuance flag and the flag activation checks stay in agreement.
    pub async fn deactivate(&self, key: &str) -> Result<(), CoreError> {
        let key = self.require_existing(key).await?;
        let fields = Fields::new()
            .with(field::ACTIVE, false)
            .with(field::IS_ACTIVE, false);
        self.store.patch(LICENSES, key, fields).await.map_err(|e| {
            error!(error = %e, key = redact(key), "deactivation write failed");
            CoreError::from(e)
        })?;
        info!(key = redact(key), "license deactivated");
        Ok(())
    }

    /// Record that `user_id` redeemed `key`. Prior use is not checked.
    pub async fn mark_used(&self, key: &str, user_id: &str) -> Result<(), CoreError> {
        self.mark_used_at(key, user_id, Utc::now()).await
    }

    pub async fn mark_used_at(
        &self,
        key: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let user = user_id.trim();
        if user.is_empty() {
            return Err(CoreError::validation("User ID is required"));
        }
        let key = self.require_existing(key).await?;
        let fields = Fields::new()
            .with(field::USED_BY, user)
            .with(field::USED_AT, now.timestamp_millis());
        self.store.patch(LICENSES, key, fields).await.map_err(|e| {
            error!(error = %e, key = redact(key), "mark-used write failed");
            CoreError::from(e)
        })?;
        info!(key = redact(key), user, "license marked as used");
        Ok(())
    }

    /// Trim `key` and confirm a license document exists under it.
    async fn require_existing<'k>(&self, key: &'k str) -> Result<&'k str, CoreError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CoreError::validation("License key is required"));
        }
        match self.store.get(LICENSES, key).await {
            Ok(Some(_)) => Ok(key),
            Ok(None) => Err(CoreError::not_found("Invalid license key")),
            Err(e) => {
                error!(error = %e, key = redact(key), "license lookup failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_has_prefix_timestamp_and_base36_suffix() {
        let key = generate_key(1_700_000_000_000);
        let parts: Vec<&str> = key.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "LICENSE");
        assert_eq!(parts[1], "1700000000000");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn keys_do_not_collide_at_the_same_instant() {
        let keys: HashSet<String> = (0..10_000).map(|_| generate_key(42)).collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn redact_drops_random_suffix() {
        assert_eq!(redact("LICENSE-123-ABCDEFGHI"), "LICENSE-123");
        assert_eq!(redact("plain"), "plain");
    }
}
