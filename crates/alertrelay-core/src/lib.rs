//! # alertrelay-core
//!
//! The caller-facing layer of the alertrelay engine.
//!
//! A monitoring or failover daemon calls [`send_alert`] when something
//! noteworthy happens; the alert is composed, handed to a detached
//! delivery task, and the caller moves on immediately. Delivery never
//! blocks the caller and never reports back to it: outcomes are
//! observable only through the log.
//!
//! ```ignore
//! use alertrelay_core::{AlertConfig, AlertSource, send_alert};
//!
//! let config = AlertConfig::builder("monitor@example.com")
//!     .relay("mail.example.com")
//!     .recipient("ops@example.com")
//!     .deployment_id("LB1")
//!     .build();
//!
//! // From inside a tokio runtime:
//! send_alert(
//!     &config,
//!     Some(&AlertSource::Instance("VI_1".into())),
//!     "entering backup state",
//!     "priority lost on eth0, demoting",
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod alert;
pub mod config;

pub use alert::{AlertSource, send_alert};
pub use config::{AlertConfig, AlertConfigBuilder, MAX_BODY_LENGTH, MAX_SUBJECT_LENGTH};
