// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task-token registry for the heartbeat protocol.
//!
//! An in-flight launch registers its correlation token and parks on the
//! returned [`TaskWaiter`]. Instances report through the three primitives
//! (`heartbeat`, `success`, `failure`) keyed by token. A token has at most
//! one waiter; once the waiter is dropped the token is gone and later
//! signals are rejected.

use fleet_core::TaskToken;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("task {0} does not exist")]
    TaskDoesNotExist(TaskToken),
    #[error("task {0} already has a waiter")]
    AlreadyRegistered(TaskToken),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSignal {
    Heartbeat,
    Success { output: String },
    Failure { reason: Option<String> },
}

#[derive(Clone, Default)]
pub struct TaskTokenRegistry {
    inner: Arc<Mutex<HashMap<TaskToken, mpsc::UnboundedSender<TaskSignal>>>>,
}

impl TaskTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `token`. Fails if another waiter already holds it.
    pub fn register(&self, token: &TaskToken) -> Result<TaskWaiter, TokenError> {
        let mut tasks = self.inner.lock();
        if tasks.contains_key(token) {
            return Err(TokenError::AlreadyRegistered(token.clone()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        tasks.insert(token.clone(), tx);
        Ok(TaskWaiter { token: token.clone(), rx, registry: self.clone() })
    }

    pub fn heartbeat(&self, token: &TaskToken) -> Result<(), TokenError> {
        self.deliver(token, TaskSignal::Heartbeat)
    }

    pub fn success(&self, token: &TaskToken, output: impl Into<String>) -> Result<(), TokenError> {
        self.deliver(token, TaskSignal::Success { output: output.into() })
    }

    pub fn failure(&self, token: &TaskToken, reason: Option<String>) -> Result<(), TokenError> {
        self.deliver(token, TaskSignal::Failure { reason })
    }

    pub fn is_registered(&self, token: &TaskToken) -> bool {
        self.inner.lock().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    fn deliver(&self, token: &TaskToken, signal: TaskSignal) -> Result<(), TokenError> {
        let tasks = self.inner.lock();
        let tx = tasks.get(token).ok_or_else(|| TokenError::TaskDoesNotExist(token.clone()))?;
        tx.send(signal).map_err(|_| TokenError::TaskDoesNotExist(token.clone()))
    }

    fn release(&self, token: &TaskToken) {
        self.inner.lock().remove(token);
    }
}

/// Receiving half for one registered token. Dropping it releases the token.
pub struct TaskWaiter {
    token: TaskToken,
    rx: mpsc::UnboundedReceiver<TaskSignal>,
    registry: TaskTokenRegistry,
}

impl TaskWaiter {
    pub fn token(&self) -> &TaskToken {
        &self.token
    }

    /// Next signal, or `None` if the token was released.
    pub async fn recv(&mut self) -> Option<TaskSignal> {
        self.rx.recv().await
    }
}

impl Drop for TaskWaiter {
    fn drop(&mut self) {
        self.registry.release(&self.token);
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
