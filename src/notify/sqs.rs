use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use tracing::info;

use super::Notifier;
use crate::core::config::QueueConfig;
use crate::errors::UsersError;

/// Queue-backed notifier. The queue URL is resolved once when the notifier
/// is built and reused for every publish.
#[derive(Debug, Clone)]
pub struct SqsNotifier {
    client: SqsClient,
    queue_url: String,
}

impl SqsNotifier {
    /// # Errors
    ///
    /// Returns an error if the queue cannot be resolved by name.
    pub async fn connect(config: &QueueConfig) -> Result<Self, UsersError> {
        let shared_config = aws_config::from_env().load().await;
        let client = SqsClient::new(&shared_config);

        let queue_url = match &config.queue_url {
            Some(url) => url.clone(),
            None => {
                let resp = client
                    .get_queue_url()
                    .queue_name(&config.queue_name)
                    .send()
                    .await?;
                resp.queue_url().map(ToString::to_string).ok_or_else(|| {
                    UsersError::UpstreamFailure(format!(
                        "SQS returned no URL for queue {}",
                        config.queue_name
                    ))
                })?
            }
        };

        info!(queue_url = %queue_url, "Resolved notification queue");
        Ok(Self::with_client(client, queue_url))
    }

    #[must_use]
    pub fn with_client(client: SqsClient, queue_url: String) -> Self {
        Self { client, queue_url }
    }

    #[must_use]
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl Notifier for SqsNotifier {
    async fn publish(&self, message: &str) -> Result<(), UsersError> {
        let resp = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message)
            .send()
            .await?;

        info!(
            message_id = resp.message_id().unwrap_or_default(),
            "Published notification to SQS"
        );
        Ok(())
    }
}
