// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boot script templates.
//!
//! Each OS family has one template with nine positional `{}` placeholders
//! and `{{`/`}}` for literal braces. Values are bound by position in this
//! fixed order:
//!
//! 1. task token
//! 2. log destination
//! 3. runner name
//! 4. registration domain
//! 5. owner
//! 6. repository
//! 7. registration token
//! 8. label list
//! 9. registration URL
//!
//! Every exit path of a rendered script ends in power-off.

use fleet_core::{Os, RunnerProvisioningRequest};
use thiserror::Error;

/// Number of positional parameters a boot script consumes.
pub const BOOT_SCRIPT_PARAMS: usize = 9;

const WINDOWS_TEMPLATE: &str = include_str!("../templates/windows.ps1");
const LINUX_TEMPLATE: &str = include_str!("../templates/linux.sh");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template has {found} placeholders, expected {expected}")]
    PlaceholderCount { expected: usize, found: usize },
    #[error("unbalanced '{brace}' at byte {offset}")]
    UnbalancedBrace { brace: char, offset: usize },
}

/// The nine values substituted into a boot script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootScriptParams {
    pub task_token: String,
    pub log_destination: String,
    pub runner_name: String,
    pub registration_domain: String,
    pub owner: String,
    pub repo: String,
    pub registration_token: String,
    pub labels: String,
    pub registration_url: String,
}

impl BootScriptParams {
    pub fn from_request(request: &RunnerProvisioningRequest) -> Self {
        Self {
            task_token: request.token.to_string(),
            log_destination: request.log_destination.clone(),
            runner_name: request.runner_name.clone(),
            registration_domain: request.registration_domain.clone(),
            owner: request.owner.clone(),
            repo: request.repo.clone(),
            registration_token: request.registration_token.clone(),
            labels: request.label_list(),
            registration_url: request.registration_url.clone(),
        }
    }

    /// Values in placeholder order.
    fn positional(&self) -> [&str; BOOT_SCRIPT_PARAMS] {
        [
            &self.task_token,
            &self.log_destination,
            &self.runner_name,
            &self.registration_domain,
            &self.owner,
            &self.repo,
            &self.registration_token,
            &self.labels,
            &self.registration_url,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Literal(usize, usize),
    Brace(char),
    Slot,
}

/// A parsed, validated template for one OS family.
#[derive(Debug, Clone)]
pub struct BootScriptTemplate {
    os: Os,
    source: &'static str,
    pieces: Vec<Piece>,
}

impl BootScriptTemplate {
    pub fn for_os(os: Os) -> Result<Self, TemplateError> {
        match os {
            Os::Windows => Self::parse(os, WINDOWS_TEMPLATE),
            Os::Linux => Self::parse(os, LINUX_TEMPLATE),
        }
    }

    /// Parse `source`, rejecting it unless it has exactly nine placeholders.
    pub fn parse(os: Os, source: &'static str) -> Result<Self, TemplateError> {
        let bytes = source.as_bytes();
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            let brace = bytes[i];
            if brace != b'{' && brace != b'}' {
                i += 1;
                continue;
            }
            if start < i {
                pieces.push(Piece::Literal(start, i));
            }
            match (brace, bytes.get(i + 1)) {
                (b'{', Some(b'{')) => pieces.push(Piece::Brace('{')),
                (b'}', Some(b'}')) => pieces.push(Piece::Brace('}')),
                (b'{', Some(b'}')) => pieces.push(Piece::Slot),
                _ => {
                    return Err(TemplateError::UnbalancedBrace { brace: brace as char, offset: i })
                }
            }
            i += 2;
            start = i;
        }
        if start < bytes.len() {
            pieces.push(Piece::Literal(start, bytes.len()));
        }

        let found = pieces.iter().filter(|p| **p == Piece::Slot).count();
        if found != BOOT_SCRIPT_PARAMS {
            return Err(TemplateError::PlaceholderCount { expected: BOOT_SCRIPT_PARAMS, found });
        }
        Ok(Self { os, source, pieces })
    }

    pub fn os(&self) -> Os {
        self.os
    }

    /// Substitute `params` by position, escaping each value for the
    /// target shell's double-quoted string context.
    pub fn render(&self, params: &BootScriptParams) -> String {
        let values = params.positional();
        let mut out = String::with_capacity(self.source.len() + 256);
        let mut slot = 0;
        for piece in &self.pieces {
            match *piece {
                Piece::Literal(a, b) => out.push_str(&self.source[a..b]),
                Piece::Brace(c) => out.push(c),
                Piece::Slot => {
                    if let Some(v) = values.get(slot) {
                        out.push_str(&escape(self.os, v));
                    }
                    slot += 1;
                }
            }
        }
        out
    }
}

/// Escape a value for a double-quoted string in the OS family's shell.
pub fn escape(os: Os, value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match (os, c) {
            // PowerShell also treats typographic double quotes as delimiters.
            (Os::Windows, '`' | '"' | '$' | '\u{201C}' | '\u{201D}' | '\u{201E}') => {
                out.push('`');
                out.push(c);
            }
            (Os::Windows, '\n') => out.push_str("`n"),
            (Os::Windows, '\r') => out.push_str("`r"),
            (Os::Linux, '\\' | '"' | '$' | '`') => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "boot_script_tests.rs"]
mod tests;
