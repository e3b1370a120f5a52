use keyline_api::{Document, Fields, Value};
use serde::{Deserialize, Serialize};

use super::{MILLIS_PER_DAY, Plan, field};

/// A stored entitlement: a plan granted for a bounded duration, identified
/// by an opaque key that doubles as its document id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    pub key: String,
    pub plan: Plan,
    pub active: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub created_by: String,
    pub validity_days: i64,
    /// Epoch milliseconds; always `created_at + validity_days` days.
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<i64>,
}

impl LicenseRecord {
    /// Epoch milliseconds `validity_days` days after `now`, or `None` if that
    /// does not fit in an `i64`.
    pub fn expiry(now: i64, validity_days: i64) -> Option<i64> {
        validity_days
            .checked_mul(MILLIS_PER_DAY)
            .and_then(|span| now.checked_add(span))
    }

    /// A fresh, active, unredeemed license. `now` is sampled once by the
    /// caller so `expires_at - created_at` is exactly `validity_days` days.
    /// An expiry past the representable range saturates.
    pub fn issue(plan: Plan, issuer: &str, validity_days: i64, now: i64, key: String) -> Self {
        Self {
            key,
            plan,
            active: true,
            created_at: now,
            created_by: issuer.to_owned(),
            validity_days,
            expires_at: Self::expiry(now, validity_days).unwrap_or(i64::MAX),
            used_by: None,
            used_at: None,
        }
    }

    /// Active, never redeemed, and not yet expired.
    ///
    /// Activation does not consult this; it is exposed for admin listings.
    pub fn is_redeemable(&self, now: i64) -> bool {
        self.active && self.used_by.is_none() && self.expires_at > now
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new()
            .with(field::KEY, self.key.as_str())
            .with(field::PLAN, self.plan.as_str())
            .with(field::ACTIVE, self.active)
            .with(field::CREATED_AT, self.created_at)
            .with(field::CREATED_BY, self.created_by.as_str())
            .with(field::VALIDITY_DAYS, self.validity_days)
            .with(field::EXPIRES_AT, self.expires_at);
        if let Some(user) = &self.used_by {
            fields.insert(field::USED_BY, user.as_str());
        }
        if let Some(at) = self.used_at {
            fields.insert(field::USED_AT, Value::Integer(at));
        }
        fields
    }

    /// Decode a stored license. The key falls back to the document id when
    /// the `key` field is missing; `None` only if the field map is absent.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let f = doc.fields.as_ref()?;
        Some(Self {
            key: f.str_field(field::KEY).unwrap_or(doc.id()).to_owned(),
            plan: f
                .str_field(field::PLAN)
                .map(Plan::from_stored)
                .unwrap_or_default(),
            active: f.bool_field(field::ACTIVE).unwrap_or(false),
            created_at: f.millis_field(field::CREATED_AT).unwrap_or_default(),
            created_by: f.str_field(field::CREATED_BY).unwrap_or_default().to_owned(),
            validity_days: f.int_field(field::VALIDITY_DAYS).unwrap_or_default(),
            expires_at: f.millis_field(field::EXPIRES_AT).unwrap_or_default(),
            used_by: f.str_field(field::USED_BY).map(str::to_owned),
            used_at: f.millis_field(field::USED_AT),
        })
    }
}
