// ── License activation ──
//
// Looks a license up by its `key` field and checks the optional
// `isActive` flag. Only an explicit `false` rejects the key. Activation
// does not consult `active`, `usedBy` or `expiresAt`, and it writes
// nothing: redemption is recorded separately via `mark_used`.

use std::sync::Arc;

use keyline_api::{DocumentStore, Value};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::CoreError;
use crate::license::redact;
use crate::model::{LICENSES, field};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationOutcome {
    /// Document id of the matched license.
    pub license_id: String,
}

#[derive(Clone)]
pub struct ActivationService {
    store: Arc<dyn DocumentStore>,
}

impl ActivationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn activate(&self, license_key: &str) -> Result<ActivationOutcome, CoreError> {
        let key = license_key.trim();
        if key.is_empty() {
            return Err(CoreError::validation("License key is required"));
        }

        let docs = self
            .store
            .query_eq(LICENSES, field::KEY, Value::from(key))
            .await
            .map_err(|e| {
                error!(error = %e, key = redact(key), "license query failed");
                CoreError::from(e)
            })?;

        let Some(doc) = docs.first() else {
            warn!(key = redact(key), "activation with unknown key");
            return Err(CoreError::not_found("Invalid license key"));
        };

        let enabled = doc
            .fields
            .as_ref()
            .and_then(|f| f.bool_field(field::IS_ACTIVE))
            != Some(false);
        if !enabled {
            warn!(key = redact(key), "activation with deactivated key");
            return Err(CoreError::disabled("License key deactivated"));
        }

        let license_id = doc.id().to_owned();
        info!(key = redact(key), %license_id, "license activated");
        Ok(ActivationOutcome { license_id })
    }
}
