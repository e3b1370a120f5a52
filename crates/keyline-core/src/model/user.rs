use keyline_api::Document;
use serde::Serialize;

use super::{Plan, field};

/// The license-related slice of a user document.
///
/// The user collection belongs to account management; only these fields
/// are read here and every one of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    /// The stored plan name as written. `None` when the field is absent.
    pub plan: Option<String>,
    pub messages_limit: Option<i64>,
    pub messages_used: Option<i64>,
    pub license_key: Option<String>,
    /// Epoch milliseconds at which the current plan reverts to Free.
    pub license_expires_at: Option<i64>,
    /// Epoch milliseconds of the last daily counter reset.
    pub last_message_reset: Option<i64>,
}

impl UserRecord {
    /// `None` if the document carries no field map.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let f = doc.fields.as_ref()?;
        Some(Self {
            id: doc.id().to_owned(),
            plan: f.str_field(field::PLAN).map(str::to_owned),
            messages_limit: f.int_field(field::MESSAGES_LIMIT),
            messages_used: f.int_field(field::MESSAGES_USED),
            license_key: f.str_field(field::LICENSE_KEY).map(str::to_owned),
            license_expires_at: f.millis_field(field::LICENSE_EXPIRES_AT),
            last_message_reset: f.millis_field(field::LAST_MESSAGE_RESET),
        })
    }

    /// Anything other than exactly `Free` counts as paid, including a
    /// missing plan, names this build does not know, and `free`.
    pub fn on_paid_plan(&self) -> bool {
        self.plan.as_deref() != Some(Plan::Free.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use keyline_api::{Fields, Value};

    fn doc(fields: Option<Fields>) -> Document {
        Document {
            name: "projects/p/databases/(default)/documents/users/u1".into(),
            fields,
            ..Document::default()
        }
    }

    #[test]
    fn decodes_mixed_numeric_encodings() {
        let fields = Fields::new()
            .with("plan", "Classic")
            .with("messagesLimit", 500_i64)
            .with("messagesUsed", Value::Double(12.0))
            .with("lastMessageReset", Value::Double(1_700_000_000_000.0))
            .with("licenseExpiresAt", Value::Null);
        let user = UserRecord::from_document(&doc(Some(fields))).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.plan.as_deref(), Some("Classic"));
        assert_eq!(user.messages_used, Some(12));
        assert_eq!(user.last_message_reset, Some(1_700_000_000_000));
        assert_eq!(user.license_expires_at, None);
    }

    #[test]
    fn absent_field_map_is_none() {
        assert!(UserRecord::from_document(&doc(None)).is_none());
    }

    #[test]
    fn missing_plan_counts_as_paid() {
        let user = UserRecord::from_document(&doc(Some(Fields::new()))).unwrap();
        assert!(user.on_paid_plan());
        let free = UserRecord {
            plan: Some("Free".into()),
            ..user
        };
        assert!(!free.on_paid_plan());
    }

    #[test]
    fn only_exact_free_is_unpaid() {
        for (raw, paid) in [("Free", false), ("free", true), ("FREE", true), ("Premium", true), ("", true)] {
            let fields = Fields::new().with("plan", raw);
            let user = UserRecord::from_document(&doc(Some(fields))).unwrap();
            assert_eq!(user.on_paid_plan(), paid, "plan {raw:?}");
        }
    }
}
