//! Range fetching through the client: cache reuse, single-flight,
//! continuity validation, and enrichment stitching.

use fathom_core::{Client, Ctx, Error, Filter, Hash32};
use serde_json::json;
use std::sync::Arc;

use crate::mock_infrastructure::{hash_hex, linked_blocks_json, RpcMockBuilder};

fn client_for(url: &str) -> Client {
    Client::new(&[url]).unwrap().with_max_reads(5)
}

#[tokio::test]
async fn test_get_blocks_returns_linked_segment() {
    let mut rpc = RpcMockBuilder::new().await;
    let mock = rpc.mock_block_batch(&linked_blocks_json(100, 3), 1).await;

    let client = client_for(&rpc.url());
    let endpoint = client.next_endpoint().clone();
    let blocks = client.get(&Ctx::new(), &endpoint, &Filter::blocks(), 100, 3).await.unwrap();

    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].num(), 100);
    assert_eq!(blocks[2].num(), 102);
    assert_eq!(blocks[1].header.parent, blocks[0].header.hash);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_identical_get_served_from_cache() {
    let mut rpc = RpcMockBuilder::new().await;
    let mock = rpc.mock_block_batch(&linked_blocks_json(100, 3), 1).await;

    let client = client_for(&rpc.url());
    let endpoint = client.next_endpoint().clone();
    let ctx = Ctx::new();

    let first = client.get(&ctx, &endpoint, &Filter::blocks(), 100, 3).await.unwrap();
    let second = client.get(&ctx, &endpoint, &Filter::blocks(), 100, 3).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert_eq!(first[0].header.hash, second[0].header.hash);
    // One upstream batch serves both reads.
    mock.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_identical_gets_single_flight() {
    let mut rpc = RpcMockBuilder::new().await;
    let mock = rpc.mock_block_batch(&linked_blocks_json(100, 3), 1).await;

    let client = Arc::new(client_for(&rpc.url()));
    let endpoint = client.next_endpoint().clone();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let client = client.clone();
        let endpoint = endpoint.clone();
        handles.push(tokio::spawn(async move {
            client.get(&Ctx::new(), &endpoint, &Filter::blocks(), 100, 3).await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().len(), 3);
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_corrupt_segment_detected() {
    let mut results = linked_blocks_json(100, 3);
    results[2]["parentHash"] = json!(hash_hex(0xee));

    let mut rpc = RpcMockBuilder::new().await;
    let _mock = rpc.mock_block_batch(&results, 1).await;

    let client = client_for(&rpc.url());
    let endpoint = client.next_endpoint().clone();
    let err = client.get(&Ctx::new(), &endpoint, &Filter::blocks(), 100, 3).await.unwrap_err();
    assert!(matches!(err, Error::CorruptSegment { .. }));
}

#[tokio::test]
async fn test_nocache_endpoint_refetches() {
    let mut rpc = RpcMockBuilder::new().await;
    let mock = rpc.mock_block_batch(&linked_blocks_json(100, 2), 2).await;

    // The `nocache` marker rides in the URL path; the mock server ignores it.
    let client = Client::new(&[format!("{}/nocache", rpc.url())]).unwrap();
    let endpoint = client.next_endpoint().clone();
    let ctx = Ctx::new();

    client.get(&ctx, &endpoint, &Filter::blocks(), 100, 2).await.unwrap();
    client.get(&ctx, &endpoint, &Filter::blocks(), 100, 2).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_receipts_enrich_headers() {
    let mut rpc = RpcMockBuilder::new().await;
    let _headers = rpc.mock_block_batch(&linked_blocks_json(100, 1), 1).await;
    let receipts = rpc
        .mock_receipts(&[json!([{
            "blockHash": hash_hex(0x64),
            "blockNumber": "0x64",
            "transactionHash": hash_hex(0x0a),
            "transactionIndex": "0x0",
            "type": "0x2",
            "from": "0x1111111111111111111111111111111111111111",
            "to": "0x2222222222222222222222222222222222222222",
            "status": "0x1",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "logs": [],
            "contractAddress": null
        }])])
        .await;

    let client = client_for(&rpc.url());
    let endpoint = client.next_endpoint().clone();
    let blocks = client.get(&Ctx::new(), &endpoint, &Filter::receipts(), 100, 1).await.unwrap();

    assert_eq!(blocks.len(), 1);
    let tx = &blocks[0].txs[0];
    assert_eq!(tx.hash, Hash32::try_from(hash_hex(0x0a).as_str()).unwrap());
    assert_eq!(tx.status, 1);
    assert_eq!(tx.gas_used, 21_000);
    // The receipt's block hash ratifies the header hash.
    assert_eq!(blocks[0].header.hash, Hash32::try_from(hash_hex(0x64).as_str()).unwrap());
    receipts.assert_async().await;
}

#[tokio::test]
async fn test_traces_enrich_synthetic_blocks() {
    let mut rpc = RpcMockBuilder::new().await;
    let traces = rpc
        .mock_traces(
            "0x32",
            &[
                json!({
                    "blockHash": hash_hex(0x32),
                    "blockNumber": 50,
                    "transactionHash": hash_hex(0x0b),
                    "transactionPosition": 0,
                    "action": {
                        "callType": "call",
                        "from": "0x1111111111111111111111111111111111111111",
                        "to": "0x2222222222222222222222222222222222222222",
                        "value": "0x1"
                    }
                }),
                json!({
                    "blockHash": hash_hex(0x32),
                    "blockNumber": 50,
                    "transactionHash": hash_hex(0x0b),
                    "transactionPosition": 0,
                    "action": {
                        "callType": "delegatecall",
                        "from": "0x2222222222222222222222222222222222222222",
                        "to": "0x3333333333333333333333333333333333333333",
                        "value": "0x0"
                    }
                }),
            ],
        )
        .await;

    let client = client_for(&rpc.url());
    let endpoint = client.next_endpoint().clone();
    let blocks = client.get(&Ctx::new(), &endpoint, &Filter::traces(), 50, 1).await.unwrap();

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].num(), 50);
    let tx = &blocks[0].txs[0];
    assert_eq!(tx.trace_actions.len(), 2);
    assert_eq!(tx.trace_actions[0].idx, 0);
    assert_eq!(tx.trace_actions[1].idx, 1);
    assert_eq!(tx.trace_actions[1].call_type, "delegatecall");
    traces.assert_async().await;
}

#[tokio::test]
async fn test_failed_fetch_retries_on_next_get() {
    // First response is corrupt; the segment is left incomplete, so the
    // next get fetches again and succeeds against the replacement mock.
    let mut bad = linked_blocks_json(100, 2);
    bad[1]["parentHash"] = json!(hash_hex(0xee));

    let mut rpc = RpcMockBuilder::new().await;
    let bad_mock = rpc.mock_block_batch(&bad, 1).await;

    let client = client_for(&rpc.url());
    let endpoint = client.next_endpoint().clone();
    let ctx = Ctx::new();

    let err = client.get(&ctx, &endpoint, &Filter::blocks(), 100, 2).await.unwrap_err();
    assert!(matches!(err, Error::CorruptSegment { .. }));
    bad_mock.remove_async().await;

    let _good = rpc.mock_block_batch(&linked_blocks_json(100, 2), 1).await;
    let blocks = client.get(&ctx, &endpoint, &Filter::blocks(), 100, 2).await.unwrap();
    assert_eq!(blocks.len(), 2);
}
