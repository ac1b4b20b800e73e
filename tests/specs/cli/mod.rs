// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod boot_script;
mod event;
mod help;
mod plan;
mod status;
mod validate;
