// ── Domain model ──
//
// Typed views over the `licenses` and `users` documents. Decoding is
// lenient: absent or mistyped fields become `None` rather than errors,
// because both collections are also written by other clients.

pub mod license;
pub mod plan;
pub mod user;

pub use license::LicenseRecord;
pub use plan::Plan;
pub use user::UserRecord;

/// Collection holding one document per license, keyed by the license key.
pub const LICENSES: &str = "licenses";
/// Collection holding one document per user, keyed by user id.
pub const USERS: &str = "users";

/// Message allowance applied when a user falls back to the free tier.
pub const FREE_MESSAGES_LIMIT: i64 = 10;
/// Allowance reported for a paid user whose stored limit is missing.
pub const DEFAULT_PAID_LIMIT: i64 = 500;

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Stored field names.
pub mod field {
    // licenses
    pub const KEY: &str = "key";
    pub const PLAN: &str = "plan";
    pub const ACTIVE: &str = "active";
    pub const IS_ACTIVE: &str = "isActive";
    pub const CREATED_AT: &str = "createdAt";
    pub const CREATED_BY: &str = "createdBy";
    pub const VALIDITY_DAYS: &str = "validityDays";
    pub const EXPIRES_AT: &str = "expiresAt";
    pub const USED_BY: &str = "usedBy";
    pub const USED_AT: &str = "usedAt";

    // users
    pub const MESSAGES_LIMIT: &str = "messagesLimit";
    pub const MESSAGES_USED: &str = "messagesUsed";
    pub const LICENSE_KEY: &str = "licenseKey";
    pub const LICENSE_EXPIRES_AT: &str = "licenseExpiresAt";
    pub const LAST_MESSAGE_RESET: &str = "lastMessageReset";
}
