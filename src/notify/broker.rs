//! Broker-backed notifier speaking STOMP over TLS.
//!
//! Each publish runs a full session: connect to the first reachable
//! endpoint, `CONNECT`, `SEND`, `DISCONNECT` with a receipt, close.

use std::pin::Pin;

use async_trait::async_trait;
use openssl::ssl::{SslConnector, SslMethod};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_openssl::SslStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::Notifier;
use super::stomp::{Frame, read_frame};
use crate::core::config::{BrokerConfig, BrokerEndpoint};
use crate::errors::UsersError;

trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

type Session = BufReader<Box<dyn Transport>>;

#[derive(Clone)]
pub struct BrokerNotifier {
    config: BrokerConfig,
    tls: Option<SslConnector>,
}

impl BrokerNotifier {
    /// # Errors
    ///
    /// Returns an error if the TLS context cannot be initialised.
    pub fn new(config: BrokerConfig) -> Result<Self, UsersError> {
        let tls = if config.use_tls {
            Some(SslConnector::builder(SslMethod::tls())?.build())
        } else {
            None
        };
        Ok(Self { config, tls })
    }

    async fn open(&self) -> Result<(Session, &BrokerEndpoint), UsersError> {
        let mut last_error = None;
        for endpoint in &self.config.endpoints {
            match self.open_endpoint(endpoint).await {
                Ok(stream) => {
                    info!(host = %endpoint.host, port = endpoint.port, "Connected to broker");
                    return Ok((BufReader::new(stream), endpoint));
                }
                Err(e) => {
                    warn!(host = %endpoint.host, port = endpoint.port, "Broker endpoint unavailable: {}", e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            UsersError::UpstreamFailure("no broker endpoints configured".to_string())
        }))
    }

    async fn open_endpoint(
        &self,
        endpoint: &BrokerEndpoint,
    ) -> Result<Box<dyn Transport>, UsersError> {
        let tcp = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        let Some(connector) = &self.tls else {
            return Ok(Box::new(tcp));
        };

        let ssl = connector.configure()?.into_ssl(&endpoint.host)?;
        let mut stream = SslStream::new(ssl, tcp)?;
        Pin::new(&mut stream).connect().await?;
        Ok(Box::new(stream))
    }

    async fn login(&self, session: &mut Session, endpoint: &BrokerEndpoint) -> Result<(), UsersError> {
        let connect = Frame::new("CONNECT")
            .header("accept-version", "1.0,1.1,1.2")
            .header("host", endpoint.host.as_str())
            .header("login", self.config.user.as_str())
            .header("passcode", self.config.password.as_str())
            .header("heart-beat", "0,0");
        write_frame(session, &connect).await?;

        match read_frame(session).await? {
            Some(frame) if frame.command == "CONNECTED" => {
                debug!(version = ?frame.get_header("version"), "STOMP session established");
                Ok(())
            }
            Some(frame) if frame.command == "ERROR" => Err(broker_error(&frame)),
            Some(frame) => Err(UsersError::UpstreamFailure(format!(
                "unexpected {} frame while connecting to broker",
                frame.command
            ))),
            None => Err(UsersError::UpstreamFailure(
                "broker closed the connection during CONNECT".to_string(),
            )),
        }
    }

    async fn disconnect(session: &mut Session) -> Result<(), UsersError> {
        let receipt = Uuid::new_v4().to_string();
        write_frame(session, &Frame::new("DISCONNECT").header("receipt", receipt.as_str())).await?;

        loop {
            match read_frame(session).await? {
                Some(frame) if frame.command == "RECEIPT" => {
                    if frame.get_header("receipt-id") == Some(receipt.as_str()) {
                        return Ok(());
                    }
                }
                Some(frame) if frame.command == "ERROR" => return Err(broker_error(&frame)),
                Some(frame) => debug!(command = %frame.command, "Ignoring broker frame"),
                None => {
                    warn!("Broker closed the connection before acknowledging DISCONNECT");
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl Notifier for BrokerNotifier {
    async fn publish(&self, message: &str) -> Result<(), UsersError> {
        let (mut session, endpoint) = self.open().await?;
        self.login(&mut session, endpoint).await?;

        let send = Frame::new("SEND")
            .header("destination", self.config.destination.as_str())
            .header("content-type", "text/plain")
            .header("content-length", message.len().to_string())
            .body(message.as_bytes());
        write_frame(&mut session, &send).await?;

        Self::disconnect(&mut session).await?;
        if let Err(e) = session.get_mut().shutdown().await {
            debug!("Broker connection shutdown failed: {}", e);
        }

        info!(destination = %self.config.destination, "Published notification to broker");
        Ok(())
    }
}

async fn write_frame(session: &mut Session, frame: &Frame) -> Result<(), UsersError> {
    let stream = session.get_mut();
    stream.write_all(&frame.encode()).await?;
    stream.flush().await?;
    Ok(())
}

fn broker_error(frame: &Frame) -> UsersError {
    let message = frame.get_header("message").unwrap_or("no message");
    let details = frame.body_text();
    if details.trim().is_empty() {
        UsersError::UpstreamFailure(format!("broker error: {message}"))
    } else {
        UsersError::UpstreamFailure(format!("broker error: {message}: {}", details.trim()))
    }
}
