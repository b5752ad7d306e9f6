//! Relay endpoint and connection establishment.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::warn;

use crate::error::{Error, Result};

/// Well-known SMTP submission port.
pub const SMTP_PORT: u16 = 25;

/// Default per-operation deadline, applied to the connection attempt and
/// to every subsequent read and write of a session.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The remote mail relay a session connects to.
#[derive(Debug, Clone)]
pub struct Relay {
    /// Relay hostname or address.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Per-operation deadline.
    pub timeout: Duration,
}

impl Relay {
    /// Creates a relay endpoint on the standard SMTP port with the
    /// default deadline.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: SMTP_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-operation deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Opens a TCP connection to the relay within its deadline.
///
/// # Errors
///
/// Returns [`Error::Timeout`] if the relay does not accept the
/// connection in time, or [`Error::Io`] if the connect fails outright.
pub async fn connect(relay: &Relay) -> Result<TcpStream> {
    let addr = format!("{}:{}", relay.host, relay.port);

    match tokio::time::timeout(relay.timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => {
            warn!(%addr, error = %e, "relay connection failed");
            Err(Error::Io(e))
        }
        Err(_) => {
            warn!(%addr, "relay connection timed out");
            Err(Error::Timeout(relay.timeout))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_defaults() {
        let relay = Relay::new("mail.example.com");
        assert_eq!(relay.host, "mail.example.com");
        assert_eq!(relay.port, SMTP_PORT);
        assert_eq!(relay.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_relay_overrides() {
        let relay = Relay::new("mail.example.com")
            .port(2525)
            .timeout(Duration::from_secs(5));
        assert_eq!(relay.port, 2525);
        assert_eq!(relay.timeout, Duration::from_secs(5));
    }
}
