//! Log fetching with address and topic selectors.

use fathom_core::{Client, Ctx, Filter, Hash32};
use mockito::Matcher;
use serde_json::json;

use crate::mock_infrastructure::{hash_hex, RpcMockBuilder};

const ADDR: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn topic0() -> String {
    hash_hex(0xdd)
}

fn log_json(block: u64, tx_idx: u64, log_idx: u64) -> serde_json::Value {
    json!({
        "address": ADDR,
        "topics": [topic0()],
        "data": "0x0123",
        "logIndex": format!("0x{log_idx:x}"),
        "blockHash": hash_hex(block as u8),
        "blockNumber": format!("0x{block:x}"),
        "transactionHash": hash_hex(tx_idx as u8 + 1),
        "transactionIndex": format!("0x{tx_idx:x}"),
        "removed": false
    })
}

#[tokio::test]
async fn test_logs_stitched_by_transaction() {
    let mut rpc = RpcMockBuilder::new().await;
    let mock = rpc
        .mock_logs(
            json!({"number": "0xa", "hash": hash_hex(10)}),
            &[log_json(10, 0, 0), log_json(10, 1, 1)],
            vec![
                // The filter's selectors must be forwarded verbatim.
                Matcher::Regex(format!(r#""address":\["{ADDR}"\]"#)),
                Matcher::Regex(format!(r#""topics":\[\["{}"\]\]"#, topic0())),
                Matcher::Regex(r#""fromBlock":"0xa""#.to_string()),
                Matcher::Regex(r#""toBlock":"0xa""#.to_string()),
            ],
        )
        .await;

    let client = Client::new(&[rpc.url()]).unwrap();
    let endpoint = client.next_endpoint().clone();
    let filter = Filter::logs(vec![ADDR.to_string()], vec![vec![topic0()]]);

    let blocks = client.get(&Ctx::new(), &endpoint, &filter, 10, 1).await.unwrap();
    assert_eq!(blocks.len(), 1);

    let block = &blocks[0];
    assert_eq!(block.num(), 10);
    // Block hash comes from the log metadata.
    assert_eq!(block.header.hash, Hash32([10u8; 32]));
    assert_eq!(block.txs.len(), 2);
    assert_eq!(block.txs[0].logs.len(), 1);
    assert_eq!(block.txs[1].logs.len(), 1);
    assert_eq!(block.txs[0].hash, Hash32([1u8; 32]));
    assert_eq!(block.txs[1].hash, Hash32([2u8; 32]));
    assert_eq!(block.txs[0].logs[0].address.as_slice(), &[0xaa; 20]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_logs_over_multi_block_window() {
    let mut rpc = RpcMockBuilder::new().await;
    let _mock = rpc
        .mock_logs(
            json!({"number": "0xc", "hash": hash_hex(12)}),
            &[log_json(10, 0, 0), log_json(12, 0, 0)],
            vec![Matcher::Regex(r#""toBlock":"0xc""#.to_string())],
        )
        .await;

    let client = Client::new(&[rpc.url()]).unwrap();
    let endpoint = client.next_endpoint().clone();
    let filter = Filter::logs(Vec::new(), Vec::new());

    let blocks = client.get(&Ctx::new(), &endpoint, &filter, 10, 3).await.unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].txs[0].logs.len(), 1);
    // Block 11 saw no logs and stays a bare synthetic block.
    assert!(blocks[1].txs.is_empty());
    assert_eq!(blocks[2].txs[0].logs.len(), 1);
}

#[tokio::test]
async fn test_logs_outside_window_rejected() {
    let mut rpc = RpcMockBuilder::new().await;
    let _mock = rpc
        .mock_logs(
            json!({"number": "0xa", "hash": hash_hex(10)}),
            &[log_json(11, 0, 0)],
            Vec::new(),
        )
        .await;

    let client = Client::new(&[rpc.url()]).unwrap();
    let endpoint = client.next_endpoint().clone();
    let filter = Filter::logs(Vec::new(), Vec::new());

    let err = client.get(&Ctx::new(), &endpoint, &filter, 10, 1).await.unwrap_err();
    assert!(matches!(err, fathom_core::Error::OutOfRange { num: 11, .. }));
}
