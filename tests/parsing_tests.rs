use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use users_api::api::parsing::{create_payload, parse_create_request, request_root};
use users_api::core::models::{CreateUserRequest, Operation};

#[test]
fn test_post_body_is_decoded() {
    let event = json!({
        "httpMethod": "POST",
        "body": "{\"user_id\":\"u1\",\"email\":\"a@example.com\"}"
    });

    let payload = create_payload(&event).unwrap();
    assert_eq!(
        parse_create_request(&payload).unwrap(),
        CreateUserRequest {
            user_id: "u1".into(),
            email: "a@example.com".into(),
        }
    );
}

#[test]
fn test_get_uses_query_string_parameters() {
    let event = json!({
        "httpMethod": "GET",
        "queryStringParameters": { "user_id": "u2", "email": "b@example.com" },
        "body": "ignored"
    });

    let payload = create_payload(&event).unwrap();
    assert_eq!(payload["user_id"], "u2");
}

#[test]
fn test_wrapped_event_reads_data_object() {
    let event = json!({
        "data": {
            "httpMethod": "PUT",
            "body": "{\"user_id\":\"u3\",\"email\":\"c@example.com\"}"
        }
    });

    assert!(request_root(&event).get("httpMethod").is_some());
    let request = parse_create_request(&create_payload(&event).unwrap()).unwrap();
    assert_eq!(request.user_id, "u3");
}

#[test]
fn test_base64_body_is_decoded() {
    let body = STANDARD.encode(r#"{"user_id":"u4","email":"d@example.com"}"#);
    let event = json!({
        "httpMethod": "POST",
        "isBase64Encoded": true,
        "body": body
    });

    let request = parse_create_request(&create_payload(&event).unwrap()).unwrap();
    assert_eq!(request.email, "d@example.com");
}

#[test]
fn test_missing_or_empty_fields_are_malformed() {
    let cases = [
        json!({ "email": "a@example.com" }),
        json!({ "user_id": "u1" }),
        json!({ "user_id": "", "email": "a@example.com" }),
        json!({ "user_id": "u1", "email": null }),
        json!({ "user_id": 7, "email": "a@example.com" }),
    ];
    for payload in cases {
        let err = parse_create_request(&payload).unwrap_err();
        assert!(err.is_malformed_request(), "{payload} should be rejected");
    }
}

#[test]
fn test_undecodable_payloads_are_malformed() {
    let cases = [
        json!({ "httpMethod": "POST" }),
        json!({ "httpMethod": "POST", "body": "{not json" }),
        json!({ "httpMethod": "POST", "body": "[1, 2]" }),
        json!({ "httpMethod": "GET", "queryStringParameters": null }),
        json!({ "httpMethod": "POST", "isBase64Encoded": true, "body": "%%%" }),
    ];
    for event in cases {
        let err = create_payload(&event).unwrap_err();
        assert!(err.is_malformed_request(), "{event} should be rejected");
    }
}

#[test]
fn test_operation_names() {
    assert_eq!("create".parse::<Operation>().unwrap(), Operation::Create);
    assert_eq!("handler.get".parse::<Operation>().unwrap(), Operation::Get);
    assert_eq!("Schema".parse::<Operation>().unwrap(), Operation::Schema);
    assert!("delete".parse::<Operation>().is_err());
}
