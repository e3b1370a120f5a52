//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use chrono::DateTime;

use keyline_api::{DocumentStore, RestStore, StoreConfig};

use crate::error::CliError;

/// Open the REST-backed store for a resolved profile.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, CliError> {
    tracing::debug!(project = %config.project_id, "opening document store");
    Ok(Arc::new(RestStore::new(config)?))
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so the action is refused.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Epoch milliseconds as `YYYY-MM-DD HH:MM` UTC.
pub fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_render_as_utc_minutes() {
        assert_eq!(format_millis(0), "1970-01-01 00:00");
        assert_eq!(format_millis(1_700_000_000_000), "2023-11-14 22:13");
    }

    #[test]
    fn yes_flag_skips_the_prompt() {
        assert!(matches!(confirm("Proceed?", "test", true), Ok(true)));
    }
}
