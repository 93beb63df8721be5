//! Data store client for the `users` table.
//!
//! Every call opens its own connection and closes it before returning; there
//! is no pool and nothing is cached between invocations.

use std::time::Duration;

use sqlx::{AnyConnection, Connection};
use tracing::{info, warn};

use crate::core::config::DatabaseConfig;
use crate::core::models::User;
use crate::errors::UsersError;

/// Upper bound on establishing a connection to the store.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const INSERT_USER: &str = "INSERT INTO users (user_id, email) VALUES (?, ?)";
const SELECT_USERS: &str = "SELECT user_id, email FROM users";
const DROP_USERS: &str = "DROP TABLE IF EXISTS users";
const CREATE_USERS: &str = "CREATE TABLE users (user_id VARCHAR(255) NOT NULL, email VARCHAR(255) NOT NULL, PRIMARY KEY (user_id))";

#[derive(Debug, Clone)]
pub struct UserStore {
    url: String,
}

impl UserStore {
    /// # Errors
    ///
    /// Returns an error if the configured connection URL cannot be built.
    pub fn new(config: &DatabaseConfig) -> Result<Self, UsersError> {
        sqlx::any::install_default_drivers();
        Ok(Self {
            url: config.connection_url()?,
        })
    }

    async fn connect(&self) -> Result<AnyConnection, UsersError> {
        let conn = tokio::time::timeout(CONNECT_TIMEOUT, AnyConnection::connect(&self.url))
            .await
            .map_err(|_| {
                UsersError::UpstreamFailure(format!(
                    "database connection timed out after {}s",
                    CONNECT_TIMEOUT.as_secs()
                ))
            })??;
        info!("SUCCESS: Connection to database succeeded");
        Ok(conn)
    }

    async fn release(conn: AnyConnection) {
        if let Err(e) = conn.close().await {
            warn!("Failed to close database connection: {}", e);
        }
    }

    /// # Errors
    ///
    /// Returns `UpstreamFailure` if the connection or the insert fails,
    /// including a primary-key violation for an existing `user_id`.
    pub async fn insert_user(&self, user: &User) -> Result<(), UsersError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(INSERT_USER)
            .bind(user.user_id.as_str())
            .bind(user.email.as_str())
            .execute(&mut conn)
            .await;
        Self::release(conn).await;

        result?;
        Ok(())
    }

    /// All rows in whatever order the store returns them.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamFailure` if the connection or the query fails.
    pub async fn list_users(&self) -> Result<Vec<User>, UsersError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query_as::<_, (String, String)>(SELECT_USERS)
            .fetch_all(&mut conn)
            .await;
        Self::release(conn).await;

        Ok(result?
            .into_iter()
            .map(|(user_id, email)| User { user_id, email })
            .collect())
    }

    /// Drops and recreates the `users` table. Existing rows are lost.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamFailure` if the connection or either statement fails.
    pub async fn recreate_schema(&self) -> Result<(), UsersError> {
        let mut conn = self.connect().await?;
        let result = async {
            sqlx::query(DROP_USERS).execute(&mut conn).await?;
            info!("Dropped tables");
            sqlx::query(CREATE_USERS).execute(&mut conn).await?;
            info!("Created tables");
            Ok::<_, sqlx::Error>(())
        }
        .await;
        Self::release(conn).await;

        result?;
        Ok(())
    }
}
