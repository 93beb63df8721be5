/// Users API - a minimal REST API over a relational `users` table that
/// publishes a notification whenever a user is created.
///
/// # Architecture
///
/// Each operation (`create`, `get`, `schema`) is deployed as its own Lambda
/// function. Two binaries exist, differing only in the notification
/// transport:
/// - `users-sqs` publishes to an SQS queue
/// - `users-mq` publishes to a broker destination over STOMP/TLS
///
/// The system uses:
/// - AWS Lambda for serverless execution
/// - sqlx for the per-request database connection
/// - SQS or a STOMP broker for create notifications
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use users_api::api::UsersHandler;
/// use users_api::core::config::{DatabaseConfig, QueueConfig};
/// use users_api::notify::SqsNotifier;
/// use users_api::store::UserStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     users_api::setup_logging();
///
///     let store = UserStore::new(&DatabaseConfig::with_url("mysql://admin:secret@db/users"))?;
///     let notifier = SqsNotifier::connect(&QueueConfig {
///         queue_name: "users".to_string(),
///         queue_url: None,
///     })
///     .await?;
///     let handler = UsersHandler::new(store, notifier);
///
///     let event = serde_json::json!({
///         "httpMethod": "POST",
///         "body": "{\"user_id\":\"u1\",\"email\":\"a@example.com\"}"
///     });
///     let envelope = handler.create(&event).await;
///     println!("{} {}", envelope.status_code, envelope.body);
///     Ok(())
/// }
/// ```
// Module declarations
pub mod api;
pub mod core;
pub mod errors;
pub mod notify;
pub mod store;

pub use errors::UsersError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration, filtered by `RUST_LOG` (default `info`). It
/// should be called once at the start of each Lambda binary.
///
/// # Example
///
/// ```
/// users_api::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
