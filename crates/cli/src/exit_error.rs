// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! so that `main()` owns process termination.

use std::fmt;

/// Invalid or unreadable configuration.
pub const EXIT_CONFIG: i32 = 2;
/// A collector payload that could not be parsed or handled.
pub const EXIT_EVENT: i32 = 3;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn config(err: impl fmt::Display) -> Self {
        Self::new(EXIT_CONFIG, err.to_string())
    }

    pub fn event(err: impl fmt::Display) -> Self {
        Self::new(EXIT_EVENT, err.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
