// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet status`

use super::Context;
use crate::output::{join_or_dash, print_fields, print_json, OutputFormat};
use anyhow::Result;

pub fn handle(ctx: &Context, format: OutputFormat) -> Result<()> {
    let status = ctx.provider.status();
    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Text => print_fields(&[
            ("type", status.kind.clone()),
            ("labels", join_or_dash(&status.labels)),
            ("security groups", join_or_dash(&status.security_groups)),
            ("log group", status.log_group.clone()),
            ("launch template", status.ami.launch_template.to_string()),
            ("builder log group", status.ami.ami_builder_log_group.clone()),
        ]),
    }
    Ok(())
}
