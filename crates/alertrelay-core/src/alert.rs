//! Alert submission and subject composition.

use std::net::SocketAddr;
use std::sync::Arc;

use alertrelay_smtp::{Message, Relay, deliver};
use tracing::{debug, warn};

use crate::config::{AlertConfig, MAX_BODY_LENGTH, MAX_SUBJECT_LENGTH};

/// What triggered the alert. Used only to compose the subject line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertSource {
    /// A monitored backend, identified by its service address.
    Backend(SocketAddr),
    /// A redundancy instance, identified by its configured name.
    Instance(String),
}

/// Submits an alert for background delivery and returns immediately.
///
/// Nothing happens when no relay or no recipients are configured.
/// Otherwise the subject is composed from `source` and the deployment
/// identifier, subject and body are truncated to their limits, and a
/// detached task delivers the mail. No outcome is reported to the
/// caller; successes and failures appear in the log only.
///
/// Must be called from within a tokio runtime.
pub fn send_alert(config: &AlertConfig, source: Option<&AlertSource>, subject: &str, body: &str) {
    let Some((relay, helo_host, message)) = prepare(config, source, subject, body) else {
        return;
    };

    tokio::spawn(async move {
        if let Err(e) = deliver(&relay, &helo_host, message).await {
            warn!(error = %e, "alert delivery failed");
        }
    });
}

/// Turns one alert request into a delivery job, or `None` when the
/// configuration rules it out before any socket or task exists.
fn prepare(
    config: &AlertConfig,
    source: Option<&AlertSource>,
    subject: &str,
    body: &str,
) -> Option<(Relay, String, Message)> {
    // Absent configuration is a quiet no-op, not a failure.
    if config.recipients.is_empty() {
        return None;
    }
    let host = config.relay_host.as_ref()?;

    let helo_host = local_hostname(config)?;

    let relay = Relay::new(host)
        .port(config.relay_port)
        .timeout(config.timeout);

    let message = Message {
        sender: config.sender.clone(),
        recipients: Arc::clone(&config.recipients),
        subject: compose_subject(config, source, subject),
        body: truncate(body, MAX_BODY_LENGTH).to_string(),
    };

    Some((relay, helo_host, message))
}

/// Name announced in the HELO greeting: the configured override, or the
/// local hostname. An unresolvable name drops the alert rather than
/// greeting the relay with undefined text.
fn local_hostname(config: &AlertConfig) -> Option<String> {
    if let Some(name) = &config.helo_hostname {
        return Some(name.clone());
    }

    match gethostname::gethostname().into_string() {
        Ok(name) => Some(name),
        Err(raw) => {
            warn!(?raw, "local hostname is not valid UTF-8, dropping alert");
            None
        }
    }
}

/// Composes the subject line from the alert source and deployment id.
fn compose_subject(config: &AlertConfig, source: Option<&AlertSource>, subject: &str) -> String {
    let prefix = config
        .deployment_id
        .as_deref()
        .map(|id| format!("[{id}] "))
        .unwrap_or_default();

    let composed = match source {
        Some(AlertSource::Backend(addr)) => format!("{prefix}Backend {addr} - {subject}"),
        Some(AlertSource::Instance(name)) => format!("{prefix}Instance {name} - {subject}"),
        None => format!("{prefix}{subject}"),
    };

    truncate(&composed, MAX_SUBJECT_LENGTH).to_string()
}

/// Truncates to at most `max` bytes on a character boundary.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    debug!(max, "alert text truncated");
    &text[..end]
}
