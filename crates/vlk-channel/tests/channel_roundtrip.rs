//! Integration tests: two channel instances talking through one shared
//! in-memory backend, the way a client and server share one remote list.

use std::sync::Arc;
use std::time::Duration;

use vlk_channel::{Channel, ChannelError, MemoryBackend, RelayConfig};

#[tokio::test]
async fn roundtrip_between_two_channels() {
    let backend = Arc::new(MemoryBackend::new());
    let alice = Channel::spawn("proto", backend.clone(), RelayConfig::dev());
    let bob = Channel::spawn("proto", backend, RelayConfig::dev());

    alice.give("handshake", "request", "ping".into()).unwrap();
    let request = bob
        .get_within("handshake", "request", Duration::from_secs(2))
        .await
        .expect("bob should receive alice's request");
    assert_eq!(request, "ping");

    bob.give("handshake", "response", "pong".into()).unwrap();
    let response = alice
        .get_within("handshake", "response", Duration::from_secs(2))
        .await
        .expect("alice should receive bob's response");
    assert_eq!(response, "pong");

    alice.shutdown(true);
    bob.shutdown(false);
    alice.join().await;
    bob.join().await;
}

#[tokio::test]
async fn distinct_scopes_never_interfere() {
    let backend = Arc::new(MemoryBackend::new());
    let writer_a = Channel::spawn("A", backend.clone(), RelayConfig::dev());
    let reader_a = Channel::spawn("A", backend.clone(), RelayConfig::dev());
    let scope_b = Channel::spawn("B", backend, RelayConfig::dev());

    // Same op id and tag on both scopes
    writer_a.give("x", "y", "for-A-readers".into()).unwrap();

    let leaked = scope_b
        .get_within("x", "y", Duration::from_millis(300))
        .await;
    assert!(
        matches!(leaked, Err(ChannelError::Timeout(_))),
        "a give on scope A must be invisible to a get on scope B"
    );

    // Scope A's other instance sees it
    let delivered = reader_a
        .get_within("x", "y", Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(delivered, "for-A-readers");

    writer_a.shutdown(false);
    reader_a.shutdown(false);
    scope_b.shutdown(false);
    writer_a.join().await;
    reader_a.join().await;
    scope_b.join().await;
}

#[tokio::test]
async fn scope_containing_separator_cannot_leak_into_another_scope() {
    let backend = Arc::new(MemoryBackend::new());
    let plain = Channel::spawn("A", backend.clone(), RelayConfig::dev());
    let nested = Channel::spawn("A:x", backend, RelayConfig::dev());

    // The send is rejected outright: its label "A:x:y:z" would parse as
    // scope A, op x, tag y:z
    assert!(matches!(
        nested.give("y", "z", "meant-for-nested".into()),
        Err(ChannelError::InvalidAddress(_))
    ));

    // And scope A cannot even wait at the composite address
    let got = plain.get_within("x", "y:z", Duration::from_millis(300)).await;
    assert!(matches!(got, Err(ChannelError::InvalidAddress(_))));

    plain.shutdown(false);
    nested.shutdown(false);
    plain.join().await;
    nested.join().await;
}

#[tokio::test]
async fn waiter_registered_before_send_is_woken() {
    let backend = Arc::new(MemoryBackend::new());
    let reader = Channel::spawn("p", backend.clone(), RelayConfig::dev());
    let writer = Channel::spawn("p", backend, RelayConfig::dev());

    let pending = {
        let fut = async move {
            let body = reader.get("op", "late").await;
            reader.shutdown(false);
            reader.join().await;
            body
        };
        tokio::spawn(fut)
    };

    // Give the reader time to register, then send
    tokio::time::sleep(Duration::from_millis(100)).await;
    writer.give("op", "late", "woken".into()).unwrap();

    let body = pending.await.unwrap().unwrap();
    assert_eq!(body, "woken");

    writer.shutdown(false);
    writer.join().await;
}
