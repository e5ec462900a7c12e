use super::*;
use crate::state::test_helpers;
use serde_json::{Value, json};

fn http_context() -> CallContext {
    CallContext::new(Transport::Http, Some("127.0.0.1:5000".into()))
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body should be json")
}

#[tokio::test]
async fn call_body_answers_ok_with_json() {
    let (state, demo) = test_helpers::test_app_state();
    demo.set_user_text("stored");

    let response = process_body(
        &state.registry,
        &http_context(),
        br#"{"jsonrpc":"2.0","id":1,"method":"set-text","params":["posted"]}"#,
    );

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(body_json(response).await, json!({"jsonrpc": "2.0", "id": 1, "result": null}));
    assert_eq!(demo.user_text(), "posted");
}

#[test]
fn notification_body_answers_no_content() {
    let (state, demo) = test_helpers::test_app_state();
    let response = process_body(&state.registry, &http_context(), br#"{"jsonrpc":"2.0","method":"pong"}"#);

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(demo.pongs(), 1);
}

#[tokio::test]
async fn garbage_body_answers_parse_error() {
    let (state, _demo) = test_helpers::test_app_state();
    let response = process_body(&state.registry, &http_context(), b"{not json");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!(-32700));
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn non_utf8_body_answers_parse_error() {
    let (state, _demo) = test_helpers::test_app_state();
    let response = process_body(&state.registry, &http_context(), &[0xff, 0xfe, b'{']);

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!(-32700));
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn batch_body_answers_with_array() {
    let (state, _demo) = test_helpers::test_app_state();
    let response = process_body(
        &state.registry,
        &http_context(),
        br#"[{"jsonrpc":"2.0","id":1,"method":"get-random-number"},{"jsonrpc":"2.0","method":"ping"}]"#,
    );

    let body = body_json(response).await;
    let replies = body.as_array().expect("batch reply");
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], json!(1));
}

#[tokio::test]
async fn post_endpoint_serves_calls_end_to_end() {
    let (addr, _demo) = test_helpers::spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/post"))
        .json(&json!({"jsonrpc": "2.0", "id": "abc", "method": "get-text"}))
        .send()
        .await
        .expect("post");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["id"], json!("abc"));
    assert!(body["result"].is_string());

    let response = client
        .post(format!("http://{addr}/post"))
        .json(&json!({"jsonrpc": "2.0", "method": "ping"}))
        .send()
        .await
        .expect("post");
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .post(format!("http://{addr}/post"))
        .body(vec![0xff_u8, 0xfe, b'{'])
        .send()
        .await
        .expect("post");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["error"]["code"], json!(-32700));
}
