// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet validate`

use super::Context;
use crate::output::{join_or_dash, print_fields, print_json, OutputFormat};
use anyhow::Result;
use fleet_core::{rate_expression, whole_days, MarketOptions};
use serde_json::json;

pub fn handle(ctx: &Context, format: OutputFormat) -> Result<()> {
    let c = &ctx.config;
    let p = &c.provider;
    let b = &c.builder;
    let rebuild = (whole_days(b.rebuild_interval) > 0)
        .then(|| rate_expression(b.rebuild_interval))
        .flatten();
    let market = match c.market() {
        MarketOptions::OnDemand => "on-demand".to_string(),
        MarketOptions::Spot { max_price: Some(price) } => format!("spot (max {price})"),
        MarketOptions::Spot { max_price: None } => "spot".to_string(),
    };

    match format {
        OutputFormat::Json => print_json(&json!({
            "valid": true,
            "stack": c.stack.name,
            "region": c.stack.region,
            "builder": b.name,
            "os": b.os,
            "architecture": b.architecture,
            "runnerInstanceType": p.instance_type,
            "subnets": p.subnets,
            "market": market,
            "heartbeatTimeoutSecs": p.heartbeat_timeout.as_secs(),
            "rebuildSchedule": rebuild,
        }))?,
        OutputFormat::Text => {
            println!("config ok\n");
            print_fields(&[
                ("stack", format!("{} ({})", c.stack.name, c.stack.region)),
                ("builder", format!("{} ({} / {})", b.name, b.os, b.architecture)),
                ("runner", p.instance_type.to_string()),
                ("subnets", join_or_dash(&p.subnets)),
                ("market", market),
                ("heartbeat", format!("{}s", p.heartbeat_timeout.as_secs())),
                ("rebuild", rebuild.unwrap_or_else(|| "manual only".to_string())),
            ]);
        }
    }
    Ok(())
}
