use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::UsersError;

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
}

/// The validated fields of a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub user_id: String,
    pub email: String,
}

impl From<CreateUserRequest> for User {
    fn from(request: CreateUserRequest) -> Self {
        User {
            user_id: request.user_id,
            email: request.email,
        }
    }
}

/// Which handler operation a deployed function serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Get,
    Schema,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::Schema => "schema",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = UsersError;

    /// Accepts a bare operation name or a Lambda handler string such as
    /// `handler.create`, in which case the last segment is used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().rsplit('.').next().unwrap_or_default();
        match name.to_ascii_lowercase().as_str() {
            "create" => Ok(Operation::Create),
            "get" => Ok(Operation::Get),
            "schema" => Ok(Operation::Schema),
            _ => Err(UsersError::Config(format!("unknown operation: {s:?}"))),
        }
    }
}

/// Text published for every created user.
#[must_use]
pub fn creation_message(user_id: &str) -> String {
    format!("Created user {user_id}")
}
