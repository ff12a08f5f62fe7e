//! Integration tests for the TCP transport
//!
//! Drives a listener and an outbound cache against each other over loopback,
//! the way the remote actor bridge uses them.

use std::time::Duration;
use switchyard_network::{ConnectionCache, Endpoint, FrameListener, DEFAULT_MAX_FRAME_SIZE};
use tokio::time::timeout;

fn loopback() -> Endpoint {
    Endpoint::new("127.0.0.1", 0)
}

#[test_log::test(tokio::test)]
async fn test_per_endpoint_ordering_is_preserved() {
    let listener = FrameListener::bind(&loopback(), DEFAULT_MAX_FRAME_SIZE).unwrap();
    let endpoint = listener.local_endpoint().clone();
    let mut inbound = listener.start().unwrap();

    let mut cache = ConnectionCache::new(Duration::from_secs(1), DEFAULT_MAX_FRAME_SIZE);
    for i in 0..100u32 {
        cache.send(&endpoint, &i.to_be_bytes()).await.unwrap();
    }

    for expected in 0..100u32 {
        let frame = timeout(Duration::from_secs(2), inbound.recv())
            .await
            .expect("frame within deadline")
            .expect("listener still open");
        let got = u32::from_be_bytes(frame.payload[..].try_into().unwrap());
        assert_eq!(got, expected);
    }
}

#[test_log::test(tokio::test)]
async fn test_two_destinations_get_separate_connections() {
    let first = FrameListener::bind(&loopback(), DEFAULT_MAX_FRAME_SIZE).unwrap();
    let second = FrameListener::bind(&loopback(), DEFAULT_MAX_FRAME_SIZE).unwrap();
    let (ep1, ep2) = (first.local_endpoint().clone(), second.local_endpoint().clone());
    let mut in1 = first.start().unwrap();
    let mut in2 = second.start().unwrap();

    let mut cache = ConnectionCache::new(Duration::from_secs(1), DEFAULT_MAX_FRAME_SIZE);
    cache.send(&ep1, b"to-first").await.unwrap();
    cache.send(&ep2, b"to-second").await.unwrap();
    assert_eq!(cache.len(), 2);

    assert_eq!(&in1.recv().await.unwrap().payload[..], b"to-first");
    assert_eq!(&in2.recv().await.unwrap().payload[..], b"to-second");
}

#[test_log::test(tokio::test)]
async fn test_dropped_listener_refuses_new_connections() {
    let listener = FrameListener::bind(&loopback(), DEFAULT_MAX_FRAME_SIZE).unwrap();
    let endpoint = listener.local_endpoint().clone();
    let inbound = listener.start().unwrap();
    drop(inbound);

    // Give the aborted accept task a moment to release the socket
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut cache = ConnectionCache::new(Duration::from_millis(500), DEFAULT_MAX_FRAME_SIZE);
    let result = cache.send(&endpoint, b"nobody home").await;
    assert!(result.is_err());
    assert!(cache.is_empty());
}
