// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the external collaborators: the compute provider, the
//! image-build service, and the acknowledgement callback used by teardown.
//!
//! Each adapter is a trait so the engine can run against a real provider or
//! the in-memory fakes exported under the `test-support` feature.

pub mod ack;
pub mod compute;
pub mod image_build;

pub use ack::{redact_url, AckError, AckResponse, AckSink, AckStatus, HttpAckSink};
pub use compute::{ComputeAdapter, ComputeError, ComputeErrorKind, LaunchSpec, ShutdownBehavior};
pub use image_build::{ImageBuildError, ImageBuildService};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use ack::{AckCall, FakeAckSink};
#[cfg(any(test, feature = "test-support"))]
pub use compute::{ComputeCall, FakeCompute};
#[cfg(any(test, feature = "test-support"))]
pub use image_build::{BuildCall, FakeImageBuild};
