//! Users API handler - one entry point per operation.
//!
//! Every operation catches its own failures, logs them, and answers with the
//! uniform envelope, so an invocation never fails at the runtime level.

use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info};

use super::helpers::{self, Envelope};
use super::parsing;
use crate::core::models::{Operation, User, creation_message};
use crate::errors::UsersError;
use crate::notify::Notifier;
use crate::store::UserStore;

pub struct UsersHandler<N> {
    store: UserStore,
    notifier: N,
}

impl<N: Notifier> UsersHandler<N> {
    #[must_use]
    pub fn new(store: UserStore, notifier: N) -> Self {
        Self { store, notifier }
    }

    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Lambda entry point: routes the event to the configured operation.
    ///
    /// # Errors
    ///
    /// Never returns an error; failures are reported inside the envelope.
    #[tracing::instrument(level = "info", skip(self, event), fields(request_id = %event.context.request_id))]
    pub async fn handle(
        &self,
        operation: Operation,
        event: LambdaEvent<Value>,
    ) -> Result<Envelope, Error> {
        Ok(self.dispatch(operation, &event.payload).await)
    }

    pub async fn dispatch(&self, operation: Operation, event: &Value) -> Envelope {
        info!(%operation, "Received event: {}", event);
        match operation {
            Operation::Create => self.create(event).await,
            Operation::Get => self.get(event).await,
            Operation::Schema => self.schema(event).await,
        }
    }

    /// Creates a user and publishes a notification for it.
    ///
    /// The row is written before the notification is sent. If the publish
    /// fails the row stays, and the caller still gets an error response.
    pub async fn create(&self, event: &Value) -> Envelope {
        let result = self.try_create(event).await;
        if let Err(e) = &result {
            error!(
                operation = "create",
                malformed = e.is_malformed_request(),
                "ERROR: Unexpected error: Could not create user: {}",
                e
            );
        }
        helpers::respond("Could not create user", &result)
    }

    async fn try_create(&self, event: &Value) -> Result<Value, UsersError> {
        let payload = parsing::create_payload(event)?;
        let request = parsing::parse_create_request(&payload)?;
        info!(
            "Creating user {} with email {}",
            request.user_id, request.email
        );

        let user = User::from(request);
        self.store.insert_user(&user).await?;
        self.notifier.publish(&creation_message(&user.user_id)).await?;

        Ok(payload)
    }

    /// Returns every user in the table.
    pub async fn get(&self, _event: &Value) -> Envelope {
        info!("Getting all users");
        let result = self.store.list_users().await;
        match &result {
            Ok(users) => info!("Returning {} users", users.len()),
            Err(e) => error!(
                operation = "get",
                "ERROR: Unexpected error: Could not get users: {}",
                e
            ),
        }
        helpers::respond("Could not get users", &result)
    }

    /// Drops and recreates the users table.
    pub async fn schema(&self, _event: &Value) -> Envelope {
        let result = self
            .store
            .recreate_schema()
            .await
            .map(|()| json!({ "Msg": "Created schema" }));
        if let Err(e) = &result {
            error!(
                operation = "schema",
                "ERROR: Unexpected error: Could not recreate schema: {}",
                e
            );
        }
        helpers::respond("Could not recreate schema", &result)
    }
}
