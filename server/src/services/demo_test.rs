use super::*;
use jsonrpc::{Request, Transport};
use jsonrpc::error::{INVALID_PARAMS, INVALID_REQUEST};

fn setup(ipsum: &str) -> (MethodRegistry, Arc<DemoState>, Hub) {
    let registry = MethodRegistry::new();
    let demo = Arc::new(DemoState::new(ipsum.to_owned()));
    let hub = Hub::new(8);
    register(&registry, &demo, &hub);
    (registry, demo, hub)
}

fn call(registry: &MethodRegistry, method: &str, params: Value) -> Result<Value, RpcError> {
    let ctx = CallContext::new(Transport::WebSocket, Some("client-test".into()));
    registry.process_call(&Request::call(1, method, params), &ctx).outcome
}

#[test]
fn text_chunk_is_bounded_and_char_safe() {
    assert_eq!(text_chunk("abcdef", 2, 3), "cde");
    assert_eq!(text_chunk("abcdef", 4, 3), "ef");
    assert_eq!(text_chunk("abc", 9, 3), "");
    assert_eq!(text_chunk("héllo wörld", 1, 4), "éllo");
}

#[test]
fn get_text_returns_substring_of_ipsum() {
    let ipsum = "ünïcode ".repeat(40);
    let (registry, _demo, _hub) = setup(&ipsum);

    for _ in 0..20 {
        let text = call(&registry, "get-text", Value::Null).expect("text");
        let text = text.as_str().expect("string");
        assert!(!text.is_empty());
        assert!(text.chars().count() <= TEXT_CHUNK_CHARS);
        assert!(ipsum.contains(text));
    }
}

#[test]
fn get_text_on_empty_source_is_empty_string() {
    let (registry, _demo, _hub) = setup("");
    assert_eq!(call(&registry, "get-text", Value::Null), Ok(json!("")));
}

#[test]
fn get_random_number_is_in_range_and_ignores_params() {
    let (registry, _demo, _hub) = setup("x");
    for params in [Value::Null, json!(true)] {
        let n = call(&registry, "get-random-number", params).expect("number");
        let n = n.as_f64().expect("f64");
        assert!((0.0..RANDOM_NUMBER_MAX).contains(&n));
    }
}

#[tokio::test]
async fn set_text_stores_and_broadcasts() {
    let (registry, demo, hub) = setup("x");
    let mut rx = hub.subscribe();

    assert_eq!(call(&registry, "set-text", json!("hello there")), Ok(Value::Null));
    assert_eq!(demo.user_text(), "hello there");

    let note: Value = serde_json::from_str(&rx.recv().await.expect("notification")).expect("json");
    assert_eq!(note["method"], json!(USER_TEXT_CHANGED));
    assert_eq!(note["params"], json!({"text": "hello there"}));
}

#[test]
fn set_text_accepts_array_and_object_forms() {
    let (registry, demo, _hub) = setup("x");

    call(&registry, "set-text", json!(["one"])).expect("array form");
    assert_eq!(demo.user_text(), "one");

    call(&registry, "set-text", json!({"text": "two"})).expect("object form");
    assert_eq!(demo.user_text(), "two");
}

#[test]
fn set_text_rejects_non_text() {
    let (registry, demo, _hub) = setup("x");
    demo.set_user_text("kept");

    let err = call(&registry, "set-text", json!(5)).expect_err("should fail");

    assert_eq!(err.code, INVALID_PARAMS);
    assert_eq!(demo.user_text(), "kept");
}

#[tokio::test]
async fn set_random_number_stores_and_broadcasts() {
    let (registry, demo, hub) = setup("x");
    let mut rx = hub.subscribe();

    let note = Request::notification("set-random-number", json!(42.5));
    registry.process_notification(&note, &CallContext::local());

    assert_eq!(demo.random_number(), Some(42.5));
    let note: Value = serde_json::from_str(&rx.recv().await.expect("notification")).expect("json");
    assert_eq!(note["method"], json!(RANDOM_NUMBER_CHANGED));
    assert_eq!(note["params"]["value"], json!(42.5));
}

#[test]
fn set_random_number_rejects_non_numbers() {
    let (registry, demo, _hub) = setup("x");
    let err = call(&registry, "set-random-number", json!("seven")).expect_err("should fail");
    assert_eq!(err.code, INVALID_PARAMS);
    assert_eq!(demo.random_number(), None);
}

#[test]
fn ping_and_pong_count_calls() {
    let (registry, demo, _hub) = setup("x");

    registry.process_notification(&Request::notification("ping", Value::Null), &CallContext::local());
    registry.process_notification(&Request::notification("ping", Value::Null), &CallContext::local());
    assert_eq!(call(&registry, "pong", Value::Null), Ok(Value::Null));

    assert_eq!(demo.pings(), 2);
    assert_eq!(demo.pongs(), 1);
}

#[test]
fn ping_with_params_is_invalid_request() {
    let (registry, demo, _hub) = setup("x");
    let err = call(&registry, "ping", json!({"loud": true})).expect_err("should fail");
    assert_eq!(err.code, INVALID_REQUEST);
    assert_eq!(demo.pings(), 0);
}

#[tokio::test]
async fn load_ipsum_falls_back_to_builtin() {
    let text = load_ipsum(Some(Path::new("/definitely/not/here.txt"))).await;
    assert!(text.starts_with("Lorem ipsum"));
    assert_eq!(load_ipsum(None).await, BUILTIN_IPSUM);
}
