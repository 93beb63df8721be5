// Lambda entry point for the queue variant: create notifications go to SQS.

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use tracing::info;
use users_api::api::UsersHandler;
use users_api::core::config::{DatabaseConfig, QueueConfig, operation_from_env};
use users_api::notify::SqsNotifier;
use users_api::store::UserStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    users_api::setup_logging();

    let operation = operation_from_env()?;
    let store = UserStore::new(&DatabaseConfig::from_env()?)?;
    let notifier = SqsNotifier::connect(&QueueConfig::from_env()?).await?;
    info!(%operation, "Starting users API (SQS notifications)");

    let handler = Arc::new(UsersHandler::new(store, notifier));
    run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = Arc::clone(&handler);
        async move { handler.handle(operation, event).await }
    }))
    .await
}
