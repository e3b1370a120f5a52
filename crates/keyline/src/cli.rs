//! Clap derive structures for the `keyline` CLI.
//!
//! Global flags are flattened into every subcommand; each resource group
//! owns a nested subcommand enum.

use std::net::SocketAddr;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use keyline_core::Plan;

// ── Top-level CLI ────────────────────────────────────────────────────

/// keyline: issue license keys, activate them, and reset daily message quotas
#[derive(Debug, Parser)]
#[command(
    name = "keyline",
    version,
    about = "Issue license keys and manage daily message quotas",
    long_about = "Issue, activate and administer subscription license keys, \
        and run the daily message-quota reset, against a hosted document store.\n\n\
        `keyline serve` exposes the same operations over HTTP.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Document store profile to use
    #[arg(long, short = 'p', env = "KEYLINE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Cloud project id (overrides the profile)
    #[arg(long, env = "KEYLINE_PROJECT", global = true)]
    pub project: Option<String>,

    /// Document store API key
    #[arg(long, env = "KEYLINE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "KEYLINE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides the profile)
    #[arg(long, env = "KEYLINE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    JsonCompact,
    Yaml,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Top-level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Issue and administer license keys
    #[command(alias = "lic")]
    License(LicenseArgs),

    /// Daily message quota maintenance
    Quota(QuotaArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Serve ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (overrides `server.bind`)
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Use a throwaway in-memory store instead of the configured profile
    #[arg(long)]
    pub memory: bool,
}

// ── License ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: LicenseCommand,
}

#[derive(Debug, Subcommand)]
pub enum LicenseCommand {
    /// Issue a new license key
    Generate {
        /// Plan the key grants (Free, Classic, Pro)
        #[arg(long)]
        plan: Plan,

        /// Administrator issuing the key
        #[arg(long)]
        issuer: String,

        /// Validity period in days
        #[arg(long, default_value = "30")]
        days: i64,
    },

    /// List keys issued by an administrator, newest first
    #[command(alias = "ls")]
    List {
        /// Administrator id
        #[arg(long)]
        issuer: String,
    },

    /// Check a key the way the activation endpoint does
    Activate {
        /// License key
        key: String,
    },

    /// Disable a key so it can no longer be activated
    Deactivate {
        /// License key
        key: String,
    },

    /// Record that a user redeemed a key
    Use {
        /// License key
        key: String,

        /// Redeeming user id
        #[arg(long)]
        user: String,
    },
}

// ── Quota ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct QuotaArgs {
    #[command(subcommand)]
    pub command: QuotaCommand,
}

#[derive(Debug, Subcommand)]
pub enum QuotaCommand {
    /// Apply license expiry and the daily counter reset to one user
    Reset {
        /// User document id
        user_id: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plan_parses_case_insensitively() {
        let cli = Cli::try_parse_from([
            "keyline", "license", "generate", "--plan", "pro", "--issuer", "a1",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Command::License(LicenseArgs {
                command: LicenseCommand::Generate { plan, days, .. },
            }) => {
                assert_eq!(plan, Plan::Pro);
                assert_eq!(days, 30);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
