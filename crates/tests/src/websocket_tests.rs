//! `newHeads`-driven tip updates through the WebSocket refresher.

use fathom_core::{Client, Ctx, Hash32};
use std::time::Duration;

use crate::mock_infrastructure::{hash_hex, MockWebSocketServer, RpcMockBuilder};

#[tokio::test]
async fn test_new_heads_drive_tip_cache() {
    let ws = MockWebSocketServer::new().await.unwrap();
    // Queue the confirmation and an out-of-order burst: the duplicate
    // height must be ignored, leaving (101, H4) as the final state.
    ws.send_subscription_confirmation("0xsub1").await;
    ws.send_new_heads(99, &hash_hex(0x01)).await;
    ws.send_new_heads(100, &hash_hex(0x02)).await;
    ws.send_new_heads(100, &hash_hex(0x03)).await;
    ws.send_new_heads(101, &hash_hex(0x04)).await;

    let mut rpc = RpcMockBuilder::new().await;
    // Direct fetches fall back to a stale tip the WS feed overtakes.
    let _latest = rpc.mock_latest(1, &hash_hex(0x00), 0).await;

    let client = Client::new(&[rpc.url()]).unwrap().with_ws_url(ws.url());
    let endpoint = client.next_endpoint().clone();
    let ctx = Ctx::new();

    // The first call launches the WS listener (n=0 also forces one direct
    // fetch, which returns the stale tip and is ignored by the cache).
    client.latest(&ctx, &endpoint, 0).await.unwrap();
    assert!(ws.wait_for_subscription(Duration::from_secs(5)).await);

    // Poll until the subscription feed has landed in the cache.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (num, hash) = client.latest(&ctx, &endpoint, 101).await.unwrap();
        if num == 101 {
            assert_eq!(hash, Hash32([0x04; 32]));
            break;
        }
        assert!(std::time::Instant::now() < deadline, "tip never reached 101, got {num}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_subscription_request_is_sent() {
    let ws = MockWebSocketServer::new().await.unwrap();
    let mut rpc = RpcMockBuilder::new().await;
    let _latest = rpc.mock_latest(5, &hash_hex(0x05), 0).await;

    let client = Client::new(&[rpc.url()]).unwrap().with_ws_url(ws.url());
    let endpoint = client.next_endpoint().clone();

    client.latest(&Ctx::new(), &endpoint, 0).await.unwrap();
    assert!(ws.wait_for_subscription(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_dead_refresher_relaunches_on_next_latest() {
    // No WS server is listening on this port: the refresher fails fast,
    // parks its error, and the next latest call must still succeed via the
    // direct fetch and re-arm the refresher.
    let mut rpc = RpcMockBuilder::new().await;
    let _latest = rpc.mock_latest(7, &hash_hex(0x07), 0).await;

    let client = Client::new(&[rpc.url()])
        .unwrap()
        .with_ws_url("ws://127.0.0.1:1");
    let endpoint = client.next_endpoint().clone();
    let ctx = Ctx::new();

    let (num, _) = client.latest(&ctx, &endpoint, 0).await.unwrap();
    assert_eq!(num, 7);

    // Give the failed dial time to park its error, then keep calling: the
    // error is consumed as a miss and every call falls back to the fetch.
    tokio::time::sleep(Duration::from_millis(200)).await;
    for _ in 0..3 {
        let (num, hash) = client.latest(&ctx, &endpoint, 0).await.unwrap();
        assert_eq!(num, 7);
        assert_eq!(hash, Hash32([0x07; 32]));
    }
}
