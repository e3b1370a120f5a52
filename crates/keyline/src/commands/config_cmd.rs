//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use keyline_api::rest::client::DEFAULT_DATABASE;
use keyline_config::KEYRING_SERVICE;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Mask every plaintext secret before display.
fn redact(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(REDACTED.into());
        }
    }
    if cfg.server.admin_token.is_some() {
        cfg.server.admin_token = Some(REDACTED.into());
    }
    cfg
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Offer to store a secret in the system keyring or return it for
/// plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in
/// the keyring.
fn prompt_keyring_storage(
    secret: &str,
    keyring_user: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection != 0 {
        return Ok(Some(secret.to_owned()));
    }

    let entry = keyring::Entry::new(KEYRING_SERVICE, keyring_user).map_err(|e| {
        CliError::Validation {
            field: "keyring".into(),
            reason: format!("failed to access keyring: {e}"),
        }
    })?;
    entry.set_password(secret).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: format!("failed to store {label} in keyring: {e}"),
    })?;
    eprintln!("   ✓ {label} stored in system keyring");
    Ok(None)
}

// ── Init wizard ─────────────────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("keyline configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config().unwrap_or_default();

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let project_id: String = Input::new()
        .with_prompt("Cloud project id")
        .interact_text()
        .map_err(prompt_err)?;
    if project_id.trim().is_empty() {
        return Err(CliError::Validation {
            field: "project_id".into(),
            reason: "project id cannot be empty".into(),
        });
    }

    let database: String = Input::new()
        .with_prompt("Database id")
        .default(DEFAULT_DATABASE.into())
        .interact_text()
        .map_err(prompt_err)?;

    let base_url: String = Input::new()
        .with_prompt("API base URL (blank for the hosted service)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let key = rpassword::prompt_password("API key (blank to skip): ").map_err(prompt_err)?;
    let api_key = if key.is_empty() {
        None
    } else {
        prompt_keyring_storage(&key, &format!("{profile_name}/api-key"), "API key")?
    };

    if Confirm::new()
        .with_prompt("Protect the HTTP admin routes with a bearer token?")
        .default(true)
        .interact()
        .map_err(prompt_err)?
    {
        let token = rpassword::prompt_password("Admin token: ").map_err(prompt_err)?;
        if !token.is_empty() {
            cfg.server.admin_token =
                prompt_keyring_storage(&token, "server/admin-token", "admin token")?;
        }
    }

    let profile = Profile {
        project_id: project_id.trim().into(),
        database,
        base_url: Some(base_url.trim().to_owned()).filter(|u| !u.is_empty()),
        api_key,
        ..Profile::default()
    };
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());

    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Try it: keyline license list --issuer <ADMIN_ID>");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redact(config::load_config()?);
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_masks_plaintext_secrets_only() {
        let mut cfg = Config::default();
        cfg.server.admin_token = Some("hunter2".into());
        cfg.profiles.insert(
            "prod".into(),
            Profile {
                project_id: "demo".into(),
                api_key: Some("AIza-secret".into()),
                api_key_env: Some("PROD_KEY".into()),
                ..Profile::default()
            },
        );
        cfg.profiles.insert("dev".into(), Profile::default());

        let shown = redact(cfg);
        assert_eq!(shown.server.admin_token.as_deref(), Some(REDACTED));
        assert_eq!(shown.profiles["prod"].api_key.as_deref(), Some(REDACTED));
        assert_eq!(shown.profiles["prod"].api_key_env.as_deref(), Some("PROD_KEY"));
        assert_eq!(shown.profiles["dev"].api_key, None);
    }
}
