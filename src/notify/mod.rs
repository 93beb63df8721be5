//! Notification transports published to after a user is created

pub mod broker;
pub mod sqs;
pub mod stomp;

use async_trait::async_trait;

use crate::errors::UsersError;

pub use broker::BrokerNotifier;
pub use sqs::SqsNotifier;

/// Delivers one best-effort text message per call.
///
/// Implementations do not retry; a failed publish is reported to the caller
/// and the message is dropped.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, message: &str) -> Result<(), UsersError>;
}
