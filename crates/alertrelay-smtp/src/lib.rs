//! # alertrelay-smtp
//!
//! A background SMTP delivery engine for alert mail.
//!
//! This crate speaks the minimal RFC 821 command sequence needed to hand
//! one message (subject + body) to a relay for a list of recipients:
//! `HELO`, `MAIL FROM`, one `RCPT TO` per recipient, `DATA`, the message
//! itself, and `QUIT`. It is built for fire-and-forget alerting from a
//! monitoring daemon, so a delivery session is driven to a terminal
//! outcome on its own task, every read and write carries the same
//! deadline, and any failure tears the session down without retry.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use alertrelay_smtp::{deliver, Message, Relay};
//!
//! #[tokio::main]
//! async fn main() -> alertrelay_smtp::Result<()> {
//!     let relay = Relay::new("mail.example.com");
//!     let message = Message {
//!         sender: "monitor@example.com".into(),
//!         recipients: Arc::from(vec!["ops@example.com".to_string()]),
//!         subject: "backend down".into(),
//!         body: "backend 10.0.0.1:80 stopped answering".into(),
//!     };
//!     deliver(&relay, "monitor-host.example.com", message).await
//! }
//! ```
//!
//! ## Session stages
//!
//! ```text
//! Connect ──220──→ Helo ──250──→ MailFrom ──250──→ RcptTo ──250──┐
//!                                                    ↑───────────┘ (next recipient)
//!                                RcptTo ──250, list done──→ Data ──354──→ Body ──250──→ Quit
//! ```
//!
//! Any other reply code jumps the session to a failed state; the next
//! write cycle observes it and tears the session down. Stages never move
//! backwards.
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: relay endpoint and connection establishment
//! - [`parser`]: incremental reply scanner
//! - [`session`]: the per-delivery state machine and its driver
//! - [`types`]: replies and the outgoing message

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod session;
pub mod types;

pub use connection::{Relay, SMTP_PORT, connect};
pub use error::{Error, Result};
pub use session::{Session, Stage};
pub use types::{Message, Reply};

use tracing::debug;

/// Delivers `message` through `relay`, introducing ourselves as
/// `helo_host`, and drives the session to a terminal outcome.
///
/// The connection and every subsequent read and write are bounded by
/// `relay.timeout`. On success the relay has accepted the message for
/// all recipients and the session has quit cleanly.
///
/// # Errors
///
/// Returns an error if the connection cannot be established within the
/// deadline, if any read or write fails or times out, if a reply
/// overflows the receive buffer, or if the relay answers any stage with
/// an unexpected status code. All failures are terminal: the socket is
/// closed and nothing is retried.
pub async fn deliver(relay: &Relay, helo_host: &str, message: Message) -> Result<()> {
    let stream = connect(relay).await?;
    debug!(host = %relay.host, port = relay.port, "connected to relay");
    Session::new(message, helo_host).drive(stream, relay.timeout).await
}
