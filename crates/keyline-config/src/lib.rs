//! Shared configuration for the keyline CLI and server.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `keyline_api::StoreConfig` and
//! `keyline_core::ServerConfig`. The CLI layers its global flags on top.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use keyline_api::{StoreConfig, TlsMode, TransportConfig};
use keyline_core::ServerConfig;
use keyline_core::config::parse_utc_offset;

/// Service name under which secrets are stored in the system keyring.
pub const KEYRING_SERVICE: &str = "keyline";
/// Environment variable consulted for the admin token when the config
/// names none.
pub const ADMIN_TOKEN_ENV: &str = "KEYLINE_ADMIN_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global CLI defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// HTTP service settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Named document store profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            server: ServerSection::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile named `name`, or the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// `[server]` table.
#[derive(Debug, Deserialize, Serialize)]
pub struct ServerSection {
    /// Listen address, e.g. `"127.0.0.1:8080"`.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Offset for calendar-day evaluation, e.g. `"+02:00"`.
    #[serde(default = "default_reset_offset")]
    pub reset_utc_offset: String,

    /// Admin bearer token (plaintext, prefer keyring or env var).
    pub admin_token: Option<String>,

    /// Environment variable name containing the admin token.
    pub admin_token_env: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            reset_utc_offset: default_reset_offset(),
            admin_token: None,
            admin_token_env: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".into()
}
fn default_reset_offset() -> String {
    "+00:00".into()
}

/// A named document store profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Cloud project that owns the database.
    pub project_id: String,

    /// Database id within the project.
    #[serde(default = "default_database")]
    pub database: String,

    /// API root override (emulators, gateways). Hosted endpoint if unset.
    pub base_url: Option<String>,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

fn default_database() -> String {
    keyline_api::rest::client::DEFAULT_DATABASE.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "keyline", "keyline").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("keyline");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `KEYLINE_SERVER__BIND=0.0.0.0:9000`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KEYLINE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Walk the chain: named env var, then keyring entry, then plaintext.
fn first_secret(
    env_name: Option<&str>,
    keyring_user: &str,
    plaintext: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    if let Some(val) = env_name.and_then(&env) {
        return Some(SecretString::from(val));
    }
    if let Some(val) = keyring(keyring_user) {
        return Some(SecretString::from(val));
    }
    plaintext.map(|p| SecretString::from(p.to_owned()))
}

fn system_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn system_keyring(user: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, user)
        .ok()
        .and_then(|entry| entry.get_password().ok())
}

/// Resolve a profile's API key from the credential chain (no CLI flag step).
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    first_secret(
        profile.api_key_env.as_deref(),
        &format!("{profile_name}/api-key"),
        profile.api_key.as_deref(),
        system_env,
        system_keyring,
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the admin token. `None` leaves the admin routes unguarded.
pub fn resolve_admin_token(server: &ServerSection) -> Option<SecretString> {
    first_secret(
        Some(server.admin_token_env.as_deref().unwrap_or(ADMIN_TOKEN_ENV)),
        "server/admin-token",
        server.admin_token.as_deref(),
        system_env,
        system_keyring,
    )
}

// ── Translation to runtime config ───────────────────────────────────

/// Build a `StoreConfig` from a profile, no CLI flag overrides.
///
/// The hosted endpoint requires an API key. A profile with a custom
/// `base_url` (an emulator, typically) may go without one.
pub fn profile_to_store_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<StoreConfig, ConfigError> {
    let api_key = match resolve_api_key(profile, profile_name) {
        Ok(key) => Some(key),
        Err(ConfigError::NoCredentials { .. }) if profile.base_url.is_some() => None,
        Err(e) => return Err(e),
    };
    build_store_config(profile, api_key)
}

/// Build a `StoreConfig` from a profile and an already-resolved API key.
pub fn build_store_config(
    profile: &Profile,
    api_key: Option<SecretString>,
) -> Result<StoreConfig, ConfigError> {
    if profile.project_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "project_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let mut store = StoreConfig::new(profile.project_id.trim()).map_err(|e| {
        ConfigError::Validation {
            field: "base_url".into(),
            reason: e.to_string(),
        }
    })?;

    if let Some(ref raw) = profile.base_url {
        store.base_url = raw.parse().map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
    }

    store.database_id.clone_from(&profile.database);
    store.api_key = api_key;

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);
    store.transport = TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout)),
    };

    Ok(store)
}

/// Build a `ServerConfig` from the `[server]` table.
pub fn server_config(cfg: &Config) -> Result<ServerConfig, ConfigError> {
    let bind: SocketAddr = cfg.server.bind.parse().map_err(|_| ConfigError::Validation {
        field: "server.bind".into(),
        reason: format!("expected HOST:PORT, got '{}'", cfg.server.bind),
    })?;

    let reset_utc_offset =
        parse_utc_offset(&cfg.server.reset_utc_offset).ok_or_else(|| ConfigError::Validation {
            field: "server.reset_utc_offset".into(),
            reason: format!("expected +HH:MM, got '{}'", cfg.server.reset_utc_offset),
        })?;

    Ok(ServerConfig {
        bind,
        admin_token: resolve_admin_token(&cfg.server),
        reset_utc_offset,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn none(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn credential_chain_prefers_env_then_keyring_then_plaintext() {
        let env = |name: &str| (name == "MY_KEY").then(|| "from-env".to_string());
        let ring = |user: &str| (user == "prod/api-key").then(|| "from-ring".to_string());

        let s = first_secret(Some("MY_KEY"), "prod/api-key", Some("plain"), env, ring).unwrap();
        assert_eq!(s.expose_secret(), "from-env");

        let s = first_secret(Some("OTHER"), "prod/api-key", Some("plain"), env, ring).unwrap();
        assert_eq!(s.expose_secret(), "from-ring");

        let s = first_secret(None, "dev/api-key", Some("plain"), env, ring).unwrap();
        assert_eq!(s.expose_secret(), "plain");

        assert!(first_secret(None, "dev/api-key", None, none, none).is_none());
    }

    #[test]
    fn store_config_from_profile() {
        let profile = Profile {
            project_id: "chat-prod".into(),
            database: "(default)".into(),
            base_url: Some("http://localhost:8081/v1".into()),
            timeout: Some(5),
            ..Profile::default()
        };
        let store = build_store_config(&profile, None).unwrap();
        assert_eq!(store.project_id, "chat-prod");
        assert_eq!(store.base_url.as_str(), "http://localhost:8081/v1");
        assert_eq!(store.transport.timeout, Duration::from_secs(5));
        assert!(store.api_key.is_none());
    }

    #[test]
    fn empty_project_id_is_rejected() {
        let profile = Profile {
            database: "(default)".into(),
            ..Profile::default()
        };
        let err = build_store_config(&profile, None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "project_id"));
    }

    #[test]
    fn server_config_parses_bind_and_offset() {
        let mut cfg = Config::default();
        cfg.server.bind = "0.0.0.0:9000".into();
        cfg.server.reset_utc_offset = "+02:00".into();
        cfg.server.admin_token_env = Some("KEYLINE_TEST_UNSET_ADMIN_TOKEN_VAR".into());

        let server = server_config(&cfg).unwrap();
        assert_eq!(server.bind.port(), 9000);
        assert_eq!(server.reset_utc_offset.local_minus_utc(), 7200);
    }

    #[test]
    fn bad_bind_is_a_validation_error() {
        let mut cfg = Config::default();
        cfg.server.bind = "localhost".into();
        let err = server_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("server.bind"));
    }

    #[test]
    fn toml_file_is_merged_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "prod"

[server]
reset_utc_offset = "+01:00"

[profiles.prod]
project_id = "chat-prod"
api_key_env = "CHAT_PROD_KEY"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "prod");
        assert_eq!(profile.project_id, "chat-prod");
        assert_eq!(profile.database, "(default)");
        assert_eq!(cfg.server.reset_utc_offset, "+01:00");
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
        assert_eq!(cfg.defaults.output, "table");
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                project_id: "demo".into(),
                database: "(default)".into(),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile(Some("default")).unwrap().1.project_id, "demo");
        assert!(matches!(
            loaded.profile(Some("missing")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }
}
