use aws_sdk_sqs::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UsersError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl UsersError {
    /// Whether the error was caused by the caller's input rather than by a
    /// collaborator.
    #[must_use]
    pub fn is_malformed_request(&self) -> bool {
        matches!(self, UsersError::MalformedRequest(_))
    }
}

impl From<sqlx::Error> for UsersError {
    fn from(error: sqlx::Error) -> Self {
        UsersError::UpstreamFailure(format!("database error: {error}"))
    }
}

impl From<std::io::Error> for UsersError {
    fn from(error: std::io::Error) -> Self {
        UsersError::UpstreamFailure(format!("I/O error: {error}"))
    }
}

impl From<openssl::error::ErrorStack> for UsersError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        UsersError::UpstreamFailure(format!("TLS setup error: {error}"))
    }
}

impl From<openssl::ssl::Error> for UsersError {
    fn from(error: openssl::ssl::Error) -> Self {
        UsersError::UpstreamFailure(format!("TLS handshake error: {error}"))
    }
}

impl From<serde_json::Error> for UsersError {
    fn from(error: serde_json::Error) -> Self {
        UsersError::MalformedRequest(format!("invalid JSON payload: {error}"))
    }
}

impl From<base64::DecodeError> for UsersError {
    fn from(error: base64::DecodeError) -> Self {
        UsersError::MalformedRequest(format!("invalid base64 body: {error}"))
    }
}

// Generic implementation for AWS SDK errors
impl<E, R> From<SdkError<E, R>> for UsersError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        UsersError::UpstreamFailure(format!("SQS error: {}", DisplayErrorContext(&error)))
    }
}
