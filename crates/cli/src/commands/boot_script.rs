// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet boot-script`: render the user data one runner would boot with.

use super::Context;
use clap::Args;
use fleet_core::{RunnerProvisioningRequest, TaskToken};

#[derive(Args, Debug)]
pub struct BootScriptArgs {
    /// Repository owner (user or organization)
    #[arg(long)]
    pub owner: String,
    /// Repository name
    #[arg(long)]
    pub repo: String,
    /// Task token the instance reports with (generated when omitted)
    #[arg(long)]
    pub token: Option<String>,
    /// Runner name shown by the CI provider
    #[arg(long, default_value = "fleet-runner")]
    pub runner_name: String,
    /// Registration domain
    #[arg(long, default_value = "github.com")]
    pub domain: String,
    /// Registration URL (defaults to https://<domain>/<owner>/<repo>)
    #[arg(long)]
    pub registration_url: Option<String>,
    /// Runner registration secret
    #[arg(long, env = "FLEET_REGISTRATION_TOKEN", hide_env_values = true, default_value = "")]
    pub registration_token: String,
    /// Log destination for the runner log (defaults to the provider log group)
    #[arg(long)]
    pub log_destination: Option<String>,
}

impl BootScriptArgs {
    fn request(&self, ctx: &Context) -> RunnerProvisioningRequest {
        RunnerProvisioningRequest {
            token: self.token.as_deref().map(TaskToken::from).unwrap_or_default(),
            runner_name: self.runner_name.clone(),
            registration_domain: self.domain.clone(),
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            registration_token: self.registration_token.clone(),
            registration_url: self.registration_url.clone().unwrap_or_else(|| {
                format!("https://{}/{}/{}", self.domain, self.owner, self.repo)
            }),
            labels: ctx.provider.labels().to_vec(),
            log_destination: self
                .log_destination
                .clone()
                .unwrap_or_else(|| ctx.config.log_group()),
        }
    }
}

pub fn handle(ctx: &Context, args: &BootScriptArgs) -> anyhow::Result<()> {
    let request = args.request(ctx);
    tracing::debug!(request = %request.token, runner = %request.runner_name, "rendering boot script");
    print!("{}", ctx.provider.render_boot_script(&request));
    Ok(())
}
