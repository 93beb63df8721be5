//! Response envelope returned by every operation.
//!
//! Errors of any kind map to status 400 with the error text as the body;
//! successes map to 200 with the result serialized as JSON text.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;

use crate::errors::UsersError;

/// JSON formatter writing `", "` between items and `": "` after keys, the
/// layout clients of the users API already parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Serializes a response body with [`SpacedFormatter`]. Object keys keep
/// their insertion order.
///
/// # Errors
///
/// Returns an error if `value` fails to serialize.
pub fn to_body<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsHeaders {
    #[serde(rename = "Content-Type")]
    pub content_type: String,
    #[serde(rename = "Access-Control-Allow-Origin")]
    pub allow_origin: String,
    #[serde(rename = "Access-Control-Allow-Credentials")]
    pub allow_credentials: String,
}

impl Default for CorsHeaders {
    fn default() -> Self {
        Self {
            content_type: "application/json".to_string(),
            allow_origin: "*".to_string(),
            allow_credentials: "true".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "statusCode")]
    pub status_code: String,
    pub body: String,
    pub headers: CorsHeaders,
}

impl Envelope {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == "200"
    }
}

/// Returns a 200 envelope with the serialized result.
#[must_use]
pub fn ok_response<T: Serialize + ?Sized>(result: &T) -> Envelope {
    match to_body(result) {
        Ok(body) => Envelope {
            status_code: "200".to_string(),
            body,
            headers: CorsHeaders::default(),
        },
        Err(e) => err_response(&format!(
            "ERROR: Unexpected error: Could not serialize response: {e}"
        )),
    }
}

/// Returns a 400 envelope carrying the message as a plain string body.
#[must_use]
pub fn err_response(message: &str) -> Envelope {
    Envelope {
        status_code: "400".to_string(),
        body: message.to_string(),
        headers: CorsHeaders::default(),
    }
}

/// Formats an operation failure the way callers see it.
#[must_use]
pub fn error_message(context: &str, error: &UsersError) -> String {
    format!("ERROR: Unexpected error: {context}: {error}")
}

/// Builds the envelope for an operation outcome.
#[must_use]
pub fn respond<T: Serialize>(context: &str, result: &Result<T, UsersError>) -> Envelope {
    match result {
        Ok(value) => ok_response(value),
        Err(e) => err_response(&error_message(context, e)),
    }
}
