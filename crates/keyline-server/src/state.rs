use std::sync::Arc;

use secrecy::SecretString;

use keyline_api::DocumentStore;
use keyline_core::{ActivationService, LicenseService, QuotaService, ServerConfig};

/// Shared handler state. Services are cheap clones around one store.
#[derive(Clone)]
pub struct AppState {
    pub licenses: LicenseService,
    pub activation: ActivationService,
    pub quota: QuotaService,
    /// `None` leaves the admin routes open.
    pub admin_token: Option<Arc<SecretString>>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: &ServerConfig) -> Self {
        Self {
            licenses: LicenseService::new(store.clone()),
            activation: ActivationService::new(store.clone()),
            quota: QuotaService::new(store).with_utc_offset(config.reset_utc_offset),
            admin_token: config.admin_token.clone().map(Arc::new),
        }
    }
}
