// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn signals_reach_the_waiter_in_order() {
    let registry = TaskTokenRegistry::new();
    let token = TaskToken::from_string("tkn-a");
    let mut waiter = registry.register(&token).unwrap();

    registry.heartbeat(&token).unwrap();
    registry.success(&token, "{ }").unwrap();

    assert_eq!(waiter.recv().await, Some(TaskSignal::Heartbeat));
    assert_eq!(waiter.recv().await, Some(TaskSignal::Success { output: "{ }".to_string() }));
}

#[test]
fn second_claim_on_same_token_is_rejected() {
    let registry = TaskTokenRegistry::new();
    let token = TaskToken::from_string("tkn-a");
    let _waiter = registry.register(&token).unwrap();
    assert!(matches!(registry.register(&token), Err(TokenError::AlreadyRegistered(_))));
}

#[test]
fn unknown_token_does_not_exist() {
    let registry = TaskTokenRegistry::new();
    let token = TaskToken::from_string("tkn-missing");
    assert_eq!(
        registry.failure(&token, None).unwrap_err(),
        TokenError::TaskDoesNotExist(token.clone())
    );
}

#[test]
fn dropping_waiter_releases_token() {
    let registry = TaskTokenRegistry::new();
    let token = TaskToken::from_string("tkn-a");
    let waiter = registry.register(&token).unwrap();
    assert!(registry.is_registered(&token));
    drop(waiter);
    assert!(registry.is_empty());
    assert!(registry.heartbeat(&token).is_err());
    assert!(registry.register(&token).is_ok());
}

#[tokio::test]
async fn tokens_are_independent() {
    let registry = TaskTokenRegistry::new();
    let a = TaskToken::from_string("tkn-a");
    let b = TaskToken::from_string("tkn-b");
    let mut wa = registry.register(&a).unwrap();
    let mut wb = registry.register(&b).unwrap();

    registry.failure(&b, Some("exit 2".to_string())).unwrap();
    registry.heartbeat(&a).unwrap();

    assert_eq!(wa.recv().await, Some(TaskSignal::Heartbeat));
    assert_eq!(wb.recv().await, Some(TaskSignal::Failure { reason: Some("exit 2".to_string()) }));
    assert_eq!(registry.len(), 2);
}
