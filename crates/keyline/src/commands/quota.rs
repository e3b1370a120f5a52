//! Quota command handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use keyline_api::DocumentStore;
use keyline_core::config::parse_utc_offset;
use keyline_core::{QuotaService, ResetOutcome};

use crate::cli::{GlobalOpts, QuotaArgs, QuotaCommand};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

fn detail(outcome: &ResetOutcome) -> String {
    let mut out = outcome.message().to_owned();
    match *outcome {
        ResetOutcome::Expired {
            plan,
            messages_limit,
            messages_used,
            ..
        } => {
            let _ = write!(
                out,
                "\nPlan:     {plan}\nLimit:    {messages_limit}\nUsed:     {messages_used}"
            );
        }
        ResetOutcome::DailyReset {
            messages_used,
            messages_limit,
            ..
        } => {
            let _ = write!(out, "\nLimit:    {messages_limit}\nUsed:     {messages_used}");
        }
        ResetOutcome::NoOp => {}
    }
    out
}

pub async fn handle(
    store: Arc<dyn DocumentStore>,
    args: QuotaArgs,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        QuotaCommand::Reset { user_id } => {
            let raw = &config.server.reset_utc_offset;
            let offset = parse_utc_offset(raw).ok_or_else(|| CliError::Validation {
                field: "server.reset_utc_offset".into(),
                reason: format!("expected +HH:MM, got '{raw}'"),
            })?;

            let outcome = QuotaService::new(store)
                .with_utc_offset(offset)
                .reset_if_needed(&user_id)
                .await?;

            if !outcome.persisted() {
                tracing::warn!(user_id = %user_id, "the store rejected the quota update");
            }

            let out = output::render_single(global.output, &outcome, detail, |o| {
                o.message().to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
