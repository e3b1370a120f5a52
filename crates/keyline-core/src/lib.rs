// keyline-core: License issuance, activation and daily quota reset over a document store.

pub mod activation;
pub mod config;
pub mod error;
pub mod license;
pub mod model;
pub mod quota;

// ── Primary re-exports ──────────────────────────────────────────────
pub use activation::{ActivationOutcome, ActivationService};
pub use config::ServerConfig;
pub use error::CoreError;
pub use license::{LicenseService, generate_key};
pub use model::{LicenseRecord, Plan, UserRecord};
pub use quota::{QuotaService, ResetOutcome};
