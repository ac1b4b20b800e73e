// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet plan`: what the builder declares, without creating any of it.

use super::Context;
use crate::output::{print_fields, print_json, OutputFormat};
use anyhow::Result;
use fleet_engine::ImageBuilder;
use serde_json::json;

pub fn handle(ctx: &Context, format: OutputFormat) -> Result<()> {
    let bound = ctx.builder.bind_ami()?;
    let infrastructure = ctx.builder.create_infrastructure()?;
    let functions = ctx.registry.functions();
    let schedules = ctx.registry.schedules();
    let teardown = ctx.registry.teardown_hooks();

    match format {
        OutputFormat::Json => print_json(&json!({
            "infrastructure": infrastructure,
            "launchTemplate": bound.launch_template,
            "pipeline": bound.pipeline,
            "logGroup": bound.log_group,
            "collectors": {
                "functions": functions,
                "schedules": schedules,
                "teardown": teardown,
            },
        }))?,
        OutputFormat::Text => {
            let pipeline = &bound.pipeline;
            let schedule = pipeline
                .schedule
                .as_ref()
                .map(|s| s.expression.clone())
                .unwrap_or_else(|| "manual only".to_string());
            let mut fields = vec![
                ("pipeline", pipeline.name.clone()),
                ("recipe", pipeline.recipe_name.clone()),
                ("infrastructure", infrastructure.name.clone()),
                ("schedule", schedule),
                ("ami name", pipeline.distribution.ami.name.clone()),
            ];
            if let Some(fl) = &pipeline.distribution.fast_launch {
                fields.push((
                    "fast launch",
                    format!(
                        "{} parallel, {} snapshots",
                        fl.max_parallel_launches, fl.target_resource_count
                    ),
                ));
            }
            print_fields(&fields);
            println!("\ncollectors");
            for f in &functions {
                println!("  {} ({}s): {}", f.name, f.timeout.as_secs(), f.description);
            }
            for s in &schedules {
                println!("  {} -> {} [{}]", s.id, s.collector, s.expression);
            }
            for t in &teardown {
                println!("  {} -> {} [teardown]", t.resource_type, t.collector);
            }
        }
    }
    Ok(())
}
