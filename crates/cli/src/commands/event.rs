// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet event`: run a collector payload against the dry-run adapters.
//!
//! Shows which action an invocation dispatches to and what it would touch,
//! with the callback URL redacted. Nothing is deleted and no
//! acknowledgement is sent.

use crate::dry_run::{DryRunAck, DryRunCompute, DryRunImageBuild};
use crate::exit_error::ExitError;
use crate::output::{print_fields, print_json, OutputFormat};
use clap::{Args, ValueEnum};
use fleet_engine::{AmiCleaner, CleanerEvent, CleanerOutcome, ImageReaper, ReaperEvent};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Collector {
    /// AMI cleaner (scheduled sweeps and teardown)
    DeleteAmi,
    /// Image build version reaper
    Reaper,
}

#[derive(Args, Debug)]
pub struct EventArgs {
    /// Collector the payload is addressed to
    #[arg(value_enum)]
    pub collector: Collector,
    /// Payload file; reads stdin when omitted or `-`
    pub file: Option<PathBuf>,
    /// Log stream name reported as the physical id on failure
    #[arg(long, default_value = "fleet-cli")]
    pub log_stream: String,
}

fn read_payload(file: Option<&PathBuf>) -> Result<String, ExitError> {
    let mut payload = String::new();
    match file {
        Some(path) if path.as_os_str() != "-" => {
            payload = std::fs::read_to_string(path)
                .map_err(|e| ExitError::event(format!("failed to read {}: {e}", path.display())))?;
        }
        _ => {
            std::io::stdin().read_to_string(&mut payload).map_err(ExitError::event)?;
        }
    }
    Ok(payload)
}

pub async fn handle(args: &EventArgs, format: OutputFormat) -> anyhow::Result<()> {
    let payload = read_payload(args.file.as_ref())?;
    match args.collector {
        Collector::DeleteAmi => {
            let event: CleanerEvent = serde_json::from_str(&payload)
                .map_err(|e| ExitError::event(format!("invalid cleaner event: {e}")))?;
            let cleaner = AmiCleaner::new(DryRunCompute, DryRunAck);
            let outcome =
                cleaner.handle(&event, &args.log_stream).await.map_err(ExitError::event)?;
            match format {
                OutputFormat::Json => print_json(&json!({
                    "collector": "delete-ami",
                    "event": event.redacted(),
                    "outcome": outcome,
                }))?,
                OutputFormat::Text => {
                    let action = match &outcome {
                        CleanerOutcome::Acknowledged => "acknowledge".to_string(),
                        CleanerOutcome::Swept(r) => format!(
                            "sweep ({} listed, {} deregistered, {} snapshots)",
                            r.listed,
                            r.deregistered.len(),
                            r.snapshots_deleted.len()
                        ),
                    };
                    let owner = event
                        .owner()
                        .map(|o| format!("{} / {}", o.stack, o.builder))
                        .unwrap_or_else(|| "-".to_string());
                    print_fields(&[
                        ("collector", "delete-ami".to_string()),
                        ("request", event.request_type.to_string()),
                        ("owner", owner),
                        ("action", action),
                        (
                            "callback",
                            event.redacted().response_url.unwrap_or_else(|| "-".to_string()),
                        ),
                    ]);
                }
            }
        }
        Collector::Reaper => {
            let event: ReaperEvent = serde_json::from_str(&payload)
                .map_err(|e| ExitError::event(format!("invalid reaper event: {e}")))?;
            let reaper = ImageReaper::new(DryRunImageBuild, DryRunCompute);
            let report = reaper.handle(&event).await.map_err(ExitError::event)?;
            match format {
                OutputFormat::Json => print_json(&json!({
                    "collector": "reaper",
                    "event": event,
                    "outcome": report,
                }))?,
                OutputFormat::Text => print_fields(&[
                    ("collector", "reaper".to_string()),
                    ("recipe", event.recipe_name.clone()),
                    ("action", format!("reap ({} listed, {} deleted)", report.listed, report.deleted.len())),
                ]),
            }
        }
    }
    Ok(())
}
