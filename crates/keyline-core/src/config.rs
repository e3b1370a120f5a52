// ── Runtime service configuration ──
//
// Built by the config layer or the CLI and handed to the HTTP server.
// Never read from disk here.

use std::net::{Ipv4Addr, SocketAddr};

use chrono::{FixedOffset, Offset, Utc};
use secrecy::SecretString;

pub const DEFAULT_PORT: u16 = 8080;

/// How the HTTP service should run.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: SocketAddr,
    /// Bearer token guarding the admin routes. `None` leaves them open,
    /// which is only meant for local development.
    pub admin_token: Option<SecretString>,
    /// Offset in which the quota reset evaluates calendar days.
    pub reset_utc_offset: FixedOffset,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            admin_token: None,
            reset_utc_offset: Utc.fix(),
        }
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `Z` or `UTC` into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }
    raw.parse::<FixedOffset>().ok()
}
