//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `ConfigError` and store errors into user-facing
//! errors with actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use keyline_config::ConfigError;
use keyline_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the document store")]
    #[diagnostic(
        code(keyline::connection_failed),
        help(
            "Check network access and the profile's base_url.\n\
             Run: keyline config show"
        )
    )]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(keyline::tls_error),
        help("Check the ca_cert path configured in your profile.")
    )]
    Tls { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(keyline::timeout),
        help("Increase timeout with --timeout or check the store's availability.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("The document store rejected the API key")]
    #[diagnostic(
        code(keyline::auth_failed),
        help(
            "Verify the key and that it is enabled for the project.\n\
             Pass --api-key, set KEYLINE_API_KEY, or run: keyline config init"
        )
    )]
    AuthFailed,

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(keyline::no_credentials),
        help(
            "Configure credentials with: keyline config init\n\
             Or set the KEYLINE_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Licenses and users ───────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(keyline::not_found),
        help("Run: keyline license list --issuer <ID> to see issued keys")
    )]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(code(keyline::disabled))]
    Disabled { message: String },

    // ── Store API ────────────────────────────────────────────────────

    #[error("Document store error ({code}): {message}")]
    #[diagnostic(code(keyline::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(keyline::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(keyline::profile_not_found),
        help("Create one with: keyline config init")
    )]
    ProfileNotFound { name: String },

    #[error("No document store configured")]
    #[diagnostic(
        code(keyline::no_config),
        help(
            "Create a profile with: keyline config init\n\
             Or pass --project. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(keyline::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(keyline::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(keyline::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(keyline::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(keyline::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Tls { .. } => exit_code::CONNECTION,
            Self::AuthFailed | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Disabled { .. } => exit_code::CONFLICT,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Upstream error mapping ───────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::NotFound { message } => CliError::NotFound { message },
            CoreError::Disabled { message } => CliError::Disabled { message },
            CoreError::Server(e) => e.into(),
        }
    }
}

impl From<keyline_api::Error> for CliError {
    fn from(err: keyline_api::Error) -> Self {
        use keyline_api::Error as StoreError;

        match err {
            StoreError::InvalidApiKey => CliError::AuthFailed,
            StoreError::Transport(e) if e.is_timeout() => CliError::Timeout,
            StoreError::Transport(e) => CliError::ConnectionFailed {
                source: Box::new(e),
            },
            StoreError::InvalidUrl(e) => CliError::Validation {
                field: "base_url".into(),
                reason: e.to_string(),
            },
            StoreError::Tls(message) => CliError::Tls { message },
            StoreError::Api {
                message,
                code,
                status,
            } => CliError::ApiError {
                code: code.unwrap_or_else(|| status.to_string()),
                message,
            },
            StoreError::Write { code, message, .. } => CliError::ApiError {
                code: code.to_string(),
                message,
            },
            StoreError::Deserialization { message, .. } => CliError::ApiError {
                code: "decode".into(),
                message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound { name },
            ConfigError::Serialization(e) => CliError::Toml(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
