//! CLI configuration: thin wrapper around `keyline_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--profile, --project, --api-key, --timeout).

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;

use keyline_api::StoreConfig;
use keyline_api::rest::client::DEFAULT_DATABASE;
use keyline_config::ConfigError;
use keyline_core::ServerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use keyline_config::{Config, Profile, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile with `--project` applied.
///
/// Without a stored profile, `--project` alone is enough to describe one.
fn effective_profile(global: &GlobalOpts, config: &Config, name: &str) -> Result<Profile, CliError> {
    let mut profile = match (config.profiles.get(name), global.project.as_deref()) {
        (Some(stored), _) => stored.clone(),
        (None, Some(_)) => Profile {
            database: DEFAULT_DATABASE.into(),
            ..Profile::default()
        },
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound { name: name.into() });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(project) = global.project.as_deref() {
        project.clone_into(&mut profile.project_id);
    }
    profile.timeout = profile.timeout.or(Some(config.defaults.timeout));
    Ok(profile)
}

/// Translate the active profile + global flags into a `StoreConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_store_config(global: &GlobalOpts, config: &Config) -> Result<StoreConfig, CliError> {
    let name = active_profile_name(global, config);
    let profile = effective_profile(global, config, &name)?;

    let api_key = match global.api_key {
        Some(ref key) => Some(SecretString::from(key.clone())),
        None => match keyline_config::resolve_api_key(&profile, &name) {
            Ok(key) => Some(key),
            Err(ConfigError::NoCredentials { .. }) if profile.base_url.is_some() => None,
            Err(e) => return Err(e.into()),
        },
    };

    let mut store = keyline_config::build_store_config(&profile, api_key)?;
    if let Some(secs) = global.timeout {
        store.transport.timeout = Duration::from_secs(secs);
    }
    Ok(store)
}

/// The `[server]` table with an optional `--bind` override.
pub fn resolve_server_config(
    config: &Config,
    bind: Option<SocketAddr>,
) -> Result<ServerConfig, CliError> {
    let mut server = keyline_config::server_config(config)?;
    if let Some(addr) = bind {
        server.bind = addr;
    }
    Ok(server)
}
