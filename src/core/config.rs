use std::env;

use url::Url;

use super::models::Operation;
use crate::errors::UsersError;

/// Port used for STOMP over TLS when an endpoint does not name one.
pub const DEFAULT_BROKER_PORT: u16 = 61614;

fn required<F>(lookup: &F, key: &str) -> Result<String, UsersError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| UsersError::Config(format!("{key}: environment variable not set")))
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Reads the operation served by this process from `USERS_OPERATION`,
/// falling back to the Lambda `_HANDLER` setting.
pub fn operation_from_lookup<F>(lookup: F) -> Result<Operation, UsersError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup("USERS_OPERATION")
        .or_else(|| lookup("_HANDLER"))
        .ok_or_else(|| UsersError::Config("USERS_OPERATION: environment variable not set".into()))?;
    raw.parse()
}

pub fn operation_from_env() -> Result<Operation, UsersError> {
    operation_from_lookup(env_lookup)
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub url_override: Option<String>,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, UsersError> {
        Self::from_lookup(env_lookup)
    }

    /// Builds the config from an arbitrary key lookup. When `DATABASE_URL` is
    /// present the individual MySQL settings are optional.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, UsersError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url_override = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        if let Some(url) = url_override {
            return Ok(Self {
                host: lookup("DB_HOST").unwrap_or_default(),
                user: lookup("DB_USER").unwrap_or_default(),
                password: lookup("DB_PASS").unwrap_or_default(),
                name: lookup("DB_NAME").unwrap_or_default(),
                url_override: Some(url),
            });
        }

        Ok(Self {
            host: required(&lookup, "DB_HOST")?,
            user: required(&lookup, "DB_USER")?,
            password: lookup("DB_PASS").unwrap_or_default(),
            name: required(&lookup, "DB_NAME")?,
            url_override: None,
        })
    }

    /// Config pointing at an explicit connection URL.
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            password: String::new(),
            name: String::new(),
            url_override: Some(url.into()),
        }
    }

    /// Connection URL for the store. Credentials are percent-encoded.
    pub fn connection_url(&self) -> Result<String, UsersError> {
        if let Some(url) = &self.url_override {
            return Ok(url.clone());
        }

        let mut url = Url::parse("mysql://localhost")
            .map_err(|e| UsersError::Config(format!("database url: {e}")))?;
        url.set_host(Some(&self.host))
            .map_err(|e| UsersError::Config(format!("DB_HOST: {e}")))?;
        url.set_username(&self.user)
            .map_err(|()| UsersError::Config("DB_USER: cannot be used in a URL".into()))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|()| UsersError::Config("DB_PASS: cannot be used in a URL".into()))?;
        }
        url.set_path(&self.name);
        Ok(url.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub queue_name: String,
    pub queue_url: Option<String>,
}

impl QueueConfig {
    pub fn from_env() -> Result<Self, UsersError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, UsersError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let queue_url = lookup("SQS_QUEUE_URL").filter(|v| !v.is_empty());
        let queue_name = match &queue_url {
            Some(_) => lookup("SQS_QUEUE").unwrap_or_default(),
            None => required(&lookup, "SQS_QUEUE")?,
        };
        Ok(Self {
            queue_name,
            queue_url,
        })
    }
}

/// One broker endpoint after resolving the optional scheme and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrokerEndpoint {
    /// Parses `host`, `host:port` or `scheme://host:port`.
    pub fn parse(raw: &str, default_port: u16) -> Result<Self, UsersError> {
        let trimmed = raw.trim();
        let without_scheme = trimmed
            .split_once("://")
            .map_or(trimmed, |(_, rest)| rest)
            .trim_end_matches('/');

        let (host, port) = match without_scheme.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|e| {
                    UsersError::Config(format!("broker endpoint {raw:?}: bad port: {e}"))
                })?;
                (host, port)
            }
            None => (without_scheme, default_port),
        };

        if host.is_empty() {
            return Err(UsersError::Config(format!(
                "broker endpoint {raw:?}: missing host"
            )));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub endpoints: Vec<BrokerEndpoint>,
    pub user: String,
    pub password: String,
    pub destination: String,
    pub use_tls: bool,
}

impl BrokerConfig {
    pub fn from_env() -> Result<Self, UsersError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, UsersError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_port = match lookup("MQ_PORT").filter(|v| !v.is_empty()) {
            Some(p) => p
                .parse::<u16>()
                .map_err(|e| UsersError::Config(format!("MQ_PORT: {e}")))?,
            None => DEFAULT_BROKER_PORT,
        };

        let endpoints = vec![
            BrokerEndpoint::parse(&required(&lookup, "MQ_EP_1")?, default_port)?,
            BrokerEndpoint::parse(&required(&lookup, "MQ_EP_2")?, default_port)?,
        ];

        let use_tls = match lookup("MQ_TLS").as_deref().map(str::trim) {
            None | Some("") => true,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => return Err(UsersError::Config(format!("MQ_TLS: invalid value {v:?}"))),
        };

        Ok(Self {
            endpoints,
            user: required(&lookup, "MQ_USER")?,
            password: lookup("MQ_PASS").unwrap_or_default(),
            destination: required(&lookup, "MQ_QUEUE")?,
            use_tls,
        })
    }
}
