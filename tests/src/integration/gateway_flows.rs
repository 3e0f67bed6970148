//! # Gateway Flows
//!
//! The HTTP router and lifecycle controller against a real
//! `LedgerIndexService<InMemoryLedger>`.
//!
//! ## Flows Tested:
//!
//! 1. **Readiness gate**: nothing reaches the ledger before `Ready`
//! 2. **Write then read**: persist, list by channel, list by topic
//! 3. **Background synchronization**: records written behind the gateway's
//!    back show up after a catch-up pass
//! 4. **Ledger outage**: backing failures map to 500, init failure is terminal

#[cfg(test)]
mod tests {
    use super::super::{body_json, body_text, GatewayUnderTest};
    use axum::http::StatusCode;
    use lg_01_ledger_index::LedgerSource;
    use lg_02_api_gateway::{LifecycleError, NOT_READY_MESSAGE};
    use serde_json::json;
    use shared_types::{ChannelId, NodeState, Topic, TopicSet, TransactionEnvelope};
    use std::time::Duration;
    use tokio::time::timeout;

    // =============================================================================
    // READINESS
    // =============================================================================

    #[tokio::test]
    async fn test_nothing_reaches_the_ledger_before_ready() {
        let gateway = GatewayUnderTest::in_memory();

        let response = gateway
            .post("/persistTransaction", r#"{"data":"payload","topics":["t"]}"#)
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(response).await, NOT_READY_MESSAGE);

        let response = gateway.get("/getChannelsByTopic?topic=t").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        // The write was refused at the gate, so the ledger stayed empty.
        assert!(gateway.service.source().is_empty());
        assert_eq!(gateway.lifecycle.current_state(), NodeState::Uninitialized);
    }

    #[tokio::test]
    async fn test_readiness_probe_follows_the_lifecycle() {
        let gateway = GatewayUnderTest::in_memory();
        let mut states = gateway.lifecycle.subscribe();

        assert_eq!(
            gateway.get("/readyz").await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(gateway.get("/healthz").await.status(), StatusCode::OK);

        gateway.lifecycle.initialize().await.unwrap();
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), NodeState::Ready);

        let ready = gateway.get("/readyz").await;
        assert_eq!(ready.status(), StatusCode::OK);
        assert_eq!(body_text(ready).await, "OK");
        assert_eq!(gateway.get("/healthz").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_routes_are_404_in_every_state() {
        let gateway = GatewayUnderTest::in_memory();

        let before = gateway.get("/foo").await;
        assert_eq!(before.status(), StatusCode::NOT_FOUND);
        let message = body_text(before).await;
        assert!(message.contains("/persistTransaction"));
        assert!(message.contains("/getTransactionsByChannelId"));
        assert!(message.contains("/getChannelsByTopic"));

        gateway.lifecycle.initialize().await.unwrap();
        let after = gateway.get("/foo").await;
        assert_eq!(after.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(after).await, message);
    }

    // =============================================================================
    // WRITE THEN READ
    // =============================================================================

    #[tokio::test]
    async fn test_persist_then_read_back() {
        let gateway = GatewayUnderTest::in_memory();
        gateway.lifecycle.initialize().await.unwrap();

        let first = gateway
            .post(
                "/persistTransaction",
                r#"{"data":"first","channelId":"orders-1","topics":["orders","eu"]}"#,
            )
            .await;
        assert_eq!(first.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(first).await,
            json!({ "locationId": "0x0000000000000000" })
        );

        let second = gateway
            .post(
                "/persistTransaction",
                r#"{"data":"second","channelId":"orders-1","topics":["orders","orders"]}"#,
            )
            .await;
        assert_eq!(second.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(second).await,
            json!({ "locationId": "0x0000000000000001" })
        );

        let by_channel = gateway
            .get("/getTransactionsByChannelId?channelId=orders-1")
            .await;
        assert_eq!(by_channel.status(), StatusCode::OK);
        let listed = body_json(by_channel).await;
        let data: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["data"].as_str().unwrap())
            .collect();
        assert_eq!(data, vec!["first", "second"]);
        assert_eq!(listed[1]["topics"], json!(["orders"]));

        let by_topic = gateway.get("/getChannelsByTopic?topic=eu").await;
        assert_eq!(body_json(by_topic).await, json!(["orders-1"]));

        assert_eq!(gateway.service.source().len(), 2);
    }

    #[tokio::test]
    async fn test_transaction_without_channel_opens_its_own() {
        let gateway = GatewayUnderTest::in_memory();
        gateway.lifecycle.initialize().await.unwrap();

        gateway
            .post("/persistTransaction", r#"{"data":"a","topics":["news"]}"#)
            .await;
        gateway
            .post("/persistTransaction", r#"{"data":"b","topics":["news"]}"#)
            .await;

        let channels = body_json(gateway.get("/getChannelsByTopic?topic=news").await).await;
        assert_eq!(
            channels,
            json!(["0x0000000000000000", "0x0000000000000001"])
        );
    }

    #[tokio::test]
    async fn test_unknown_topic_is_an_empty_list() {
        let gateway = GatewayUnderTest::in_memory();
        gateway.lifecycle.initialize().await.unwrap();

        let response = gateway.get("/getChannelsByTopic?topic=nobody").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_empty_data_is_rejected_before_the_ledger() {
        let gateway = GatewayUnderTest::in_memory();
        gateway.lifecycle.initialize().await.unwrap();

        let response = gateway
            .post("/persistTransaction", r#"{"data":"   ","topics":[]}"#)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert!(gateway.service.source().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_channel_reads() {
        let gateway = GatewayUnderTest::in_memory();
        gateway.lifecycle.initialize().await.unwrap();
        gateway
            .post(
                "/persistTransaction",
                r#"{"data":"x","channelId":"c","topics":[]}"#,
            )
            .await;

        let uri = "/getTransactionsByChannelId?channelId=c";
        let (a, b) = tokio::join!(gateway.get(uri), gateway.get(uri));
        assert_eq!(a.status(), StatusCode::OK);
        assert_eq!(b.status(), StatusCode::OK);
        assert_eq!(body_json(a).await, body_json(b).await);
    }

    // =============================================================================
    // SYNCHRONIZATION
    // =============================================================================

    #[tokio::test]
    async fn test_records_written_elsewhere_are_synchronized() {
        let gateway = GatewayUnderTest::in_memory();
        gateway.lifecycle.initialize().await.unwrap();
        assert!(gateway.lifecycle.synchronization_running());

        // Another writer appends straight to the ledger.
        let envelope =
            TransactionEnvelope::new("external").with_channel(ChannelId::parse("ext").unwrap());
        let topics = TopicSet::from_iter([Topic::parse("imports").unwrap()]);
        gateway.service.source().append(envelope, topics).await.unwrap();

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
        assert!(synced.is_ok(), "external record never reached the view");
    }

    // =============================================================================
    // LEDGER OUTAGE
    // =============================================================================

    #[tokio::test]
    async fn test_unreachable_ledger_fails_initialization() {
        let gateway = GatewayUnderTest::in_memory();
        gateway.service.source().set_reachable(false);

        let result = gateway.lifecycle.initialize().await;
        assert!(matches!(result, Err(LifecycleError::Initialization(_))));
        assert_eq!(gateway.lifecycle.current_state(), NodeState::Failed);

        // Failed is terminal even once the ledger comes back.
        gateway.service.source().set_reachable(true);
        assert!(gateway.lifecycle.initialize().await.is_err());
        assert_eq!(
            gateway.get("/readyz").await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            gateway.get("/getChannelsByTopic?topic=t").await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_outage_after_ready_is_a_500_not_a_503() {
        let gateway = GatewayUnderTest::in_memory();
        gateway.lifecycle.initialize().await.unwrap();
        gateway.service.source().set_reachable(false);

        let response = gateway
            .post("/persistTransaction", r#"{"data":"lost","topics":[]}"#)
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"]
            .as_str()
            .unwrap()
            .contains("unavailable"));

        // Readiness does not degrade on backing failures.
        assert_eq!(gateway.get("/readyz").await.status(), StatusCode::OK);
        assert_eq!(gateway.lifecycle.current_state(), NodeState::Ready);
        assert_eq!(gateway.service.stats().channels, 0);
    }
}
