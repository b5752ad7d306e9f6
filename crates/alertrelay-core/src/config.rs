//! Alerting configuration.
//!
//! One [`AlertConfig`] value describes where alerts go for the whole
//! process. It is built once at startup and passed by reference into
//! [`send_alert`](crate::send_alert); sessions copy what they need at
//! creation time, so the value is never read from ambient state.

use std::sync::Arc;
use std::time::Duration;

use alertrelay_smtp::SMTP_PORT;

/// Maximum composed subject length in bytes. Longer subjects are
/// silently truncated on a character boundary.
pub const MAX_SUBJECT_LENGTH: usize = 256;

/// Maximum body length in bytes, truncated the same way.
pub const MAX_BODY_LENGTH: usize = 512;

/// Default per-operation deadline for connect, reads and writes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide alerting configuration.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Mail relay host. `None` disables alerting entirely.
    pub relay_host: Option<String>,
    /// Mail relay port.
    pub relay_port: u16,
    /// Deadline applied to the connection attempt and to every read and
    /// write of a delivery session.
    pub timeout: Duration,
    /// Envelope sender address.
    pub sender: String,
    /// Alert recipients, in delivery order. Empty disables alerting.
    pub recipients: Arc<[String]>,
    /// Deployment identifier prefixed to every subject, e.g. the
    /// cluster or router name.
    pub deployment_id: Option<String>,
    /// Overrides the locally resolved hostname in the HELO greeting.
    pub helo_hostname: Option<String>,
}

impl AlertConfig {
    /// Creates a configuration builder for the given sender address.
    #[must_use]
    pub fn builder(sender: impl Into<String>) -> AlertConfigBuilder {
        AlertConfigBuilder::new(sender)
    }
}

/// Builder for [`AlertConfig`].
#[derive(Debug, Clone)]
pub struct AlertConfigBuilder {
    relay_host: Option<String>,
    relay_port: u16,
    timeout: Duration,
    sender: String,
    recipients: Vec<String>,
    deployment_id: Option<String>,
    helo_hostname: Option<String>,
}

impl AlertConfigBuilder {
    /// Creates a new builder with the given sender address.
    #[must_use]
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            relay_host: None,
            relay_port: SMTP_PORT,
            timeout: DEFAULT_TIMEOUT,
            sender: sender.into(),
            recipients: Vec::new(),
            deployment_id: None,
            helo_hostname: None,
        }
    }

    /// Sets the mail relay host.
    #[must_use]
    pub fn relay(mut self, host: impl Into<String>) -> Self {
        self.relay_host = Some(host.into());
        self
    }

    /// Sets the mail relay port.
    #[must_use]
    pub const fn relay_port(mut self, port: u16) -> Self {
        self.relay_port = port;
        self
    }

    /// Sets the per-operation deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Appends one alert recipient.
    #[must_use]
    pub fn recipient(mut self, address: impl Into<String>) -> Self {
        self.recipients.push(address.into());
        self
    }

    /// Sets the deployment identifier used in subject lines.
    #[must_use]
    pub fn deployment_id(mut self, id: impl Into<String>) -> Self {
        self.deployment_id = Some(id.into());
        self
    }

    /// Overrides the hostname announced in the HELO greeting.
    #[must_use]
    pub fn helo_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.helo_hostname = Some(hostname.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> AlertConfig {
        AlertConfig {
            relay_host: self.relay_host,
            relay_port: self.relay_port,
            timeout: self.timeout,
            sender: self.sender,
            recipients: Arc::from(self.recipients),
            deployment_id: self.deployment_id,
            helo_hostname: self.helo_hostname,
        }
    }
}
