// Lambda entry point for the broker variant: create notifications go to a
// STOMP destination.

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use tracing::info;
use users_api::api::UsersHandler;
use users_api::core::config::{BrokerConfig, DatabaseConfig, operation_from_env};
use users_api::notify::BrokerNotifier;
use users_api::store::UserStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    users_api::setup_logging();

    let operation = operation_from_env()?;
    let store = UserStore::new(&DatabaseConfig::from_env()?)?;
    let notifier = BrokerNotifier::new(BrokerConfig::from_env()?)?;
    info!(%operation, "Starting users API (broker notifications)");

    let handler = Arc::new(UsersHandler::new(store, notifier));
    run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = Arc::clone(&handler);
        async move { handler.handle(operation, event).await }
    }))
    .await
}
