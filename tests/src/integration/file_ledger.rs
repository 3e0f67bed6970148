//! # File Ledger Flows
//!
//! Transactions persisted through the gateway survive a restart: a fresh
//! index over the same JSON-lines file replays them during `initialize()`.
//! Records appended to the file by another writer reach a running gateway
//! through background synchronization.

#[cfg(test)]
mod tests {
    use super::super::{body_json, fast_sync, GatewayUnderTest};
    use axum::http::StatusCode;
    use lg_01_ledger_index::{FileLedger, LedgerIndexService, LedgerSource};
    use serde_json::json;
    use shared_types::{ChannelId, Topic, TopicSet, TransactionEnvelope};
    use std::time::Duration;
    use tokio::time::timeout;

    async fn gateway_over(path: &std::path::Path) -> GatewayUnderTest<FileLedger> {
        let ledger = FileLedger::open(path).await.unwrap();
        GatewayUnderTest::with_service(LedgerIndexService::new(ledger, fast_sync()))
    }

    #[tokio::test]
    async fn test_restart_replays_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let gateway = gateway_over(&path).await;
            gateway.lifecycle.initialize().await.unwrap();
            for (data, topic) in [("one", "alpha"), ("two", "beta"), ("three", "alpha")] {
                let body = format!(
                    r#"{{"data":"{data}","channelId":"main","topics":["{topic}"]}}"#
                );
                let response = gateway.post("/persistTransaction", &body).await;
                assert_eq!(response.status(), StatusCode::CREATED);
            }
        }

        let restarted = gateway_over(&path).await;
        restarted.lifecycle.initialize().await.unwrap();
        assert_eq!(restarted.service.stats().applied, 3);

        let listed = body_json(
            restarted
                .get("/getTransactionsByChannelId?channelId=main")
                .await,
        )
        .await;
        let locations: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["locationId"].as_str().unwrap())
            .collect();
        assert_eq!(
            locations,
            vec![
                "0x0000000000000000",
                "0x0000000000000001",
                "0x0000000000000002"
            ]
        );

        let response = restarted
            .post(
                "/persistTransaction",
                r#"{"data":"four","channelId":"main","topics":["alpha"]}"#,
            )
            .await;
        assert_eq!(
            body_json(response).await,
            json!({ "locationId": "0x0000000000000003" })
        );

        let channels = body_json(restarted.get("/getChannelsByTopic?topic=beta").await).await;
        assert_eq!(channels, json!(["main"]));
    }

    #[tokio::test]
    async fn test_one_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let gateway = gateway_over(&path).await;
        gateway.lifecycle.initialize().await.unwrap();
        gateway
            .post("/persistTransaction", r#"{"data":"a","topics":[]}"#)
            .await;
        gateway
            .post("/persistTransaction", r#"{"data":"b","topics":[]}"#)
            .await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_appends_by_another_writer_are_synchronized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let gateway = gateway_over(&path).await;
        gateway.lifecycle.initialize().await.unwrap();
        assert!(gateway.lifecycle.synchronization_running());

        let other = FileLedger::open(&path).await.unwrap();
        let envelope =
            TransactionEnvelope::new("external").with_channel(ChannelId::parse("ext").unwrap());
        let topics = TopicSet::from_iter([Topic::parse("imports").unwrap()]);
        other.append(envelope, topics).await.unwrap();

        let synced = timeout(Duration::from_secs(5), async {
            loop {
                let response = gateway.get("/getChannelsByTopic?topic=imports").await;
                if body_json(response).await == json!(["ext"]) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(synced.is_ok(), "record from the other writer never reached the view");
        assert_eq!(gateway.service.stats().applied, 1);

        // The gateway's next write lands after the other writer's record.
        let response = gateway
            .post("/persistTransaction", r#"{"data":"local","topics":[]}"#)
            .await;
        assert_eq!(
            body_json(response).await,
            json!({ "locationId": "0x0000000000000001" })
        );
    }
}
