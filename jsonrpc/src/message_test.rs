use super::*;
use crate::error::{INVALID_PARAMS, PARSE_ERROR};
use serde_json::json;

#[test]
fn request_from_json_reads_call() {
    let req = Request::from_json(&json!({"jsonrpc": "2.0", "id": 7, "method": "get-text"})).expect("request");
    assert_eq!(req.id, Some(Id::Number(7)));
    assert_eq!(req.method, "get-text");
    assert!(req.params.is_null());
    assert!(!req.is_notification());
}

#[test]
fn request_without_id_is_notification() {
    let req = Request::from_json(&json!({"jsonrpc": "2.0", "method": "ping"})).expect("request");
    assert!(req.is_notification());
}

#[test]
fn request_with_null_id_is_notification() {
    let req = Request::from_json(&json!({"jsonrpc": "2.0", "id": null, "method": "ping"})).expect("request");
    assert!(req.is_notification());
}

#[test]
fn request_keeps_string_ids_and_params() {
    let req = Request::from_json(&json!({"jsonrpc": "2.0", "id": "abc", "method": "set-text", "params": "hello"}))
        .expect("request");
    assert_eq!(req.id, Some(Id::String("abc".into())));
    assert_eq!(req.params, json!("hello"));
}

#[test]
fn request_rejects_missing_or_wrong_version() {
    let err = Request::from_json(&json!({"id": 1, "method": "ping"})).expect_err("no version");
    assert!(matches!(err, ProtocolError::MissingVersion));

    let err = Request::from_json(&json!({"jsonrpc": "1.0", "id": 1, "method": "ping"})).expect_err("old version");
    assert!(matches!(err, ProtocolError::UnsupportedVersion(v) if v == "1.0"));

    let err = Request::from_json(&json!({"jsonrpc": 2, "id": 1, "method": "ping"})).expect_err("numeric version");
    assert!(matches!(err, ProtocolError::MissingVersion));
}

#[test]
fn request_rejects_missing_method_and_bad_ids() {
    let err = Request::from_json(&json!({"jsonrpc": "2.0", "id": 1})).expect_err("no method");
    assert!(matches!(err, ProtocolError::MissingMethod));

    let err = Request::from_json(&json!({"jsonrpc": "2.0", "id": 1, "method": 5})).expect_err("method not string");
    assert!(matches!(err, ProtocolError::MissingMethod));

    let err = Request::from_json(&json!({"jsonrpc": "2.0", "id": [1], "method": "x"})).expect_err("array id");
    assert!(matches!(err, ProtocolError::InvalidId));

    let err = Request::from_json(&json!({"jsonrpc": "2.0", "id": 1.5, "method": "x"})).expect_err("float id");
    assert!(matches!(err, ProtocolError::InvalidId));
}

#[test]
fn request_from_text_reports_bad_json() {
    let err = Request::from_text("{not json").expect_err("bad json");
    assert!(matches!(err, ProtocolError::Json(_)));
    assert_eq!(err.to_rpc_error().code, PARSE_ERROR);
}

#[test]
fn request_to_json_omits_id_and_null_params() {
    let note = Request::notification("ping", Value::Null);
    assert_eq!(note.to_json(), json!({"jsonrpc": "2.0", "method": "ping"}));

    let call = Request::call(3, "set-random-number", json!(12.5));
    assert_eq!(
        serde_json::to_value(&call).expect("serialize"),
        json!({"jsonrpc": "2.0", "id": 3, "method": "set-random-number", "params": 12.5})
    );
}

#[test]
fn response_success_serializes_null_result() {
    let resp = Response::success(Some(Id::Number(1)), Value::Null);
    assert_eq!(resp.to_json(), json!({"jsonrpc": "2.0", "id": 1, "result": null}));
}

#[test]
fn response_failure_without_id_serializes_null_id() {
    let resp = Response::failure(None, RpcError::parse_error());
    let text = serde_json::to_string(&resp).expect("serialize");
    let value: Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["id"], Value::Null);
    assert_eq!(value["error"]["code"], json!(-32700));
    assert!(value.get("result").is_none());
}

#[test]
fn response_from_json_reads_result_and_error() {
    let ok = Response::from_json(&json!({"jsonrpc": "2.0", "id": "a", "result": null})).expect("ok");
    assert_eq!(ok.id, Some(Id::from("a")));
    assert_eq!(ok.outcome, Ok(Value::Null));

    let err = Response::from_json(&json!({
        "jsonrpc": "2.0", "id": 2, "error": {"code": -32602, "message": "text expected"}
    }))
    .expect("error response");
    assert!(err.is_error());
    let rpc = err.outcome.expect_err("error outcome");
    assert_eq!(rpc.code, INVALID_PARAMS);
    assert_eq!(rpc.message, "text expected");
}

#[test]
fn response_from_json_requires_id_and_outcome() {
    let err = Response::from_json(&json!({"jsonrpc": "2.0", "result": 1})).expect_err("no id");
    assert!(matches!(err, ProtocolError::MissingId));

    let err = Response::from_json(&json!({"jsonrpc": "2.0", "id": 1})).expect_err("no outcome");
    assert!(matches!(err, ProtocolError::MissingOutcome));
}

#[test]
fn message_classifies_notifications_and_responses() {
    let note = Message::from_json(&json!({"jsonrpc": "2.0", "method": "user-text-changed", "params": {"text": "x"}}))
        .expect("notification");
    assert!(matches!(note, Message::Notification(req) if req.method == "user-text-changed"));

    let resp = Message::from_json(&json!({"jsonrpc": "2.0", "id": 9, "result": 4})).expect("response");
    assert!(matches!(resp, Message::Response(r) if r.id == Some(Id::Number(9))));
}

#[test]
fn id_display_is_plain() {
    assert_eq!(Id::Number(12).to_string(), "12");
    assert_eq!(Id::from("req-1").to_string(), "req-1");
}
