use super::*;

/// Accepts connections and never answers them.
async fn silent_server() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

#[tokio::test]
async fn methods_request_honors_timeout() {
    let addr = silent_server().await;

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_methods(&format!("http://{addr}"), Duration::from_millis(200)),
    )
    .await
    .expect("run_methods should give up on its own");

    match result {
        Err(CliError::Http(error)) => assert!(error.is_timeout(), "expected timeout, got {error}"),
        other => panic!("expected http timeout, got {other:?}"),
    }
}

#[test]
fn transport_choice_selects_urls() {
    let cli = Cli::parse_from(["jsonrpc-cli", "--transport", "http", "ping"]);
    let config = client_config(&cli).unwrap();
    assert_eq!(config.socket_url, None);
    assert_eq!(config.post_url.as_deref(), Some("http://127.0.0.1:8197/post"));
}
