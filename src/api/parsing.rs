use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::Value;

use crate::core::models::CreateUserRequest;
use crate::errors::UsersError;

/// The request fields shared by both event shapes.
#[derive(Debug, Default, Deserialize)]
pub struct RequestFields {
    #[serde(rename = "httpMethod", default)]
    pub http_method: Option<String>,
    #[serde(rename = "queryStringParameters", default)]
    pub query_string_parameters: Option<Value>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
}

/// Returns the object holding the request fields: the `data` object for
/// wrapped events, the event itself otherwise.
#[must_use]
pub fn request_root(event: &Value) -> &Value {
    match event.get("data") {
        Some(data) if data.is_object() => data,
        _ => event,
    }
}

/// # Errors
///
/// Returns `MalformedRequest` if the request fields have the wrong types.
pub fn request_fields(event: &Value) -> Result<RequestFields, UsersError> {
    RequestFields::deserialize(request_root(event))
        .map_err(|e| UsersError::MalformedRequest(format!("invalid event: {e}")))
}

/// Extracts the create payload: query parameters for GET, the decoded JSON
/// body for any other method.
///
/// # Errors
///
/// Returns `MalformedRequest` if the payload is absent or cannot be decoded.
pub fn create_payload(event: &Value) -> Result<Value, UsersError> {
    let fields = request_fields(event)?;
    let is_get = fields
        .http_method
        .as_deref()
        .is_some_and(|m| m.eq_ignore_ascii_case("GET"));

    if is_get {
        return fields
            .query_string_parameters
            .filter(Value::is_object)
            .ok_or_else(|| UsersError::MalformedRequest("missing query string parameters".into()));
    }

    let Some(body) = fields.body else {
        return Err(UsersError::MalformedRequest("missing body".into()));
    };

    let payload: Value = if fields.is_base64_encoded {
        let decoded = STANDARD.decode(body.trim())?;
        serde_json::from_slice(&decoded)?
    } else {
        serde_json::from_str(&body)?
    };

    if payload.is_object() {
        Ok(payload)
    } else {
        Err(UsersError::MalformedRequest("body is not a JSON object".into()))
    }
}

fn required_field(payload: &Value, name: &str) -> Result<String, UsersError> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| UsersError::MalformedRequest(format!("missing required field '{name}'")))
}

/// # Errors
///
/// Returns `MalformedRequest` if `user_id` or `email` is absent or empty.
pub fn parse_create_request(payload: &Value) -> Result<CreateUserRequest, UsersError> {
    Ok(CreateUserRequest {
        user_id: required_field(payload, "user_id")?,
        email: required_field(payload, "email")?,
    })
}
