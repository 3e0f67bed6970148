//! # Node Flows
//!
//! `NodeRuntime` end to end over real sockets: configuration, binding,
//! warm-up, readiness and graceful shutdown.

#[cfg(test)]
mod tests {
    use node_runtime::{LedgerBackend, NodeConfig, NodeRuntime, RuntimeError};
    use shared_types::NodeState;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn local_config() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.gateway.http.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.gateway.http.port = 0;
        config.gateway.admin.port = 0;
        config.gateway.lifecycle.warmup_delay = Duration::ZERO;
        config
    }

    async fn exchange(addr: SocketAddr, request: String) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn get(addr: SocketAddr, path: &str) -> String {
        exchange(
            addr,
            format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
        )
        .await
    }

    async fn post(addr: SocketAddr, path: &str, body: &str) -> String {
        exchange(
            addr,
            format!(
                "POST {path} HTTP/1.1\r\nHost: localhost\r\n\
                 Content-Type: application/json\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            ),
        )
        .await
    }

    #[tokio::test]
    async fn test_custom_headers_on_every_response() {
        let mut config = local_config();
        config.gateway.headers = vec![lg_02_api_gateway::HeaderEntry::new("X-Ledger-Node", "n1")];
        let node = NodeRuntime::new(config).start().await.unwrap();

        let unready = get(node.http_addr(), "/getChannelsByTopic?topic=t").await;
        assert!(unready.starts_with("HTTP/1.1 503"), "{}", unready);
        assert!(unready.to_ascii_lowercase().contains("x-ledger-node: n1"));

        let missing = get(node.http_addr(), "/nope").await;
        assert!(missing.starts_with("HTTP/1.1 404"), "{}", missing);
        assert!(missing.to_ascii_lowercase().contains("x-ledger-node: n1"));

        let preflight = exchange(
            node.http_addr(),
            "OPTIONS /persistTransaction HTTP/1.1\r\nHost: localhost\r\n\
             Origin: https://client.example\r\nAccess-Control-Request-Method: POST\r\n\
             Connection: close\r\n\r\n"
                .to_string(),
        )
        .await;
        assert!(preflight.starts_with("HTTP/1.1 200"), "{}", preflight);
        assert!(preflight.to_ascii_lowercase().contains("x-ledger-node: n1"), "{}", preflight);

        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_backed_node_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = local_config();
        config.ledger.backend = LedgerBackend::File;
        config.ledger.path = dir.path().join("ledger.jsonl");

        let node = NodeRuntime::new(config.clone())
            .start()
            .await
            .unwrap()
            .initialize_or_stop()
            .await
            .unwrap();
        assert_eq!(node.state(), NodeState::Ready);

        let created = post(
            node.http_addr(),
            "/persistTransaction",
            r#"{"data":"hello","channelId":"c1","topics":["greetings"]}"#,
        )
        .await;
        assert!(created.starts_with("HTTP/1.1 201"), "{}", created);
        node.shutdown().await.unwrap();

        let node = NodeRuntime::new(config)
            .start()
            .await
            .unwrap()
            .initialize_or_stop()
            .await
            .unwrap();
        let listed = get(node.http_addr(), "/getChannelsByTopic?topic=greetings").await;
        assert!(listed.starts_with("HTTP/1.1 200"), "{}", listed);
        assert!(listed.ends_with(r#"["c1"]"#), "{}", listed);
        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_status_reports_ready() {
        let node = NodeRuntime::new(local_config())
            .start()
            .await
            .unwrap()
            .initialize_or_stop()
            .await
            .unwrap();

        let admin = node.admin_addr().unwrap();
        let status = get(admin, "/status").await;
        assert!(status.starts_with("HTTP/1.1 200"), "{}", status);
        assert!(status.contains(r#""state":"ready""#), "{}", status);

        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_port_conflict_is_fatal() {
        let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = local_config();
        config.gateway.http.port = occupied.local_addr().unwrap().port();

        let result = NodeRuntime::new(config).run_until(std::future::pending()).await;
        assert!(matches!(result, Err(RuntimeError::Gateway(_))));
    }
}
