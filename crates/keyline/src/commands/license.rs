//! License command handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;

use keyline_api::DocumentStore;
use keyline_core::{ActivationService, LicenseRecord, LicenseService};

use crate::cli::{GlobalOpts, LicenseArgs, LicenseCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LicenseRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Plan")]
    plan: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Used By")]
    used_by: String,
}

/// Where a license stands for redemption purposes.
fn status_of(record: &LicenseRecord, now_ms: i64) -> (&'static str, bool) {
    if !record.active {
        ("inactive", false)
    } else if record.used_by.is_some() {
        ("used", false)
    } else if record.expires_at <= now_ms {
        ("expired", false)
    } else {
        ("available", true)
    }
}

impl LicenseRow {
    fn new(record: &LicenseRecord, now_ms: i64, color: bool) -> Self {
        let (label, ok) = status_of(record, now_ms);
        Self {
            key: record.key.clone(),
            plan: record.plan.to_string(),
            status: output::status(label, ok, color),
            created: util::format_millis(record.created_at),
            expires: util::format_millis(record.expires_at),
            used_by: record.used_by.clone().unwrap_or_default(),
        }
    }
}

fn detail(record: &LicenseRecord, now_ms: i64, color: bool) -> String {
    let (label, ok) = status_of(record, now_ms);
    let mut out = String::new();
    let _ = writeln!(out, "Key:      {}", record.key);
    let _ = writeln!(out, "Plan:     {} ({} messages/day)", record.plan, record.plan.daily_limit());
    let _ = writeln!(out, "Status:   {}", output::status(label, ok, color));
    let _ = writeln!(out, "Issuer:   {}", record.created_by);
    let _ = writeln!(out, "Created:  {}", util::format_millis(record.created_at));
    let _ = write!(
        out,
        "Expires:  {} ({} days)",
        util::format_millis(record.expires_at),
        record.validity_days
    );
    if let Some(ref user) = record.used_by {
        let _ = write!(out, "\nUsed by:  {user}");
    }
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Activated {
    message: &'static str,
    license_id: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    store: Arc<dyn DocumentStore>,
    args: LicenseArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let now_ms = Utc::now().timestamp_millis();
    let licenses = LicenseService::new(store.clone());

    match args.command {
        LicenseCommand::Generate { plan, issuer, days } => {
            let record = licenses.issue_at(plan, &issuer, days, Utc::now()).await?;
            let out = output::render_single(
                global.output,
                &record,
                |r| detail(r, now_ms, color),
                |r| r.key.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LicenseCommand::List { issuer } => {
            let records = licenses.list_by_issuer(&issuer).await?;
            let out = output::render_list(
                global.output,
                &records,
                |r| LicenseRow::new(r, now_ms, color),
                |r| r.key.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LicenseCommand::Activate { key } => {
            let outcome = ActivationService::new(store).activate(&key).await?;
            let activated = Activated {
                message: "License activated successfully",
                license_id: outcome.license_id,
            };
            let out = output::render_single(
                global.output,
                &activated,
                |a| format!("{} ({})", a.message, a.license_id),
                |a| a.license_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LicenseCommand::Deactivate { key } => {
            if !util::confirm(
                &format!("Deactivate license '{key}'? It can no longer be activated."),
                "license deactivate",
                global.yes,
            )? {
                return Ok(());
            }
            licenses.deactivate(&key).await?;
            if !global.quiet {
                eprintln!("License deactivated");
            }
            Ok(())
        }

        LicenseCommand::Use { key, user } => {
            licenses.mark_used(&key, &user).await?;
            if !global.quiet {
                eprintln!("License marked as used by {user}");
            }
            Ok(())
        }
    }
}
