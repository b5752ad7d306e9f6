//! The outgoing alert message.

use std::sync::Arc;

/// One alert to deliver: envelope plus content.
///
/// The recipient list is shared, read-only configuration data; the
/// session owns only a cursor into it. Subject and body are the
/// session-local copies made at submission time.
#[derive(Debug, Clone)]
pub struct Message {
    /// Envelope sender address.
    pub sender: String,
    /// Envelope recipients, in delivery order. Must be non-empty.
    pub recipients: Arc<[String]>,
    /// Subject line, already composed and truncated by the caller.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl Message {
    /// Builds the header block sent at the start of the data phase:
    /// sender, subject, and the blank line separating headers from body.
    #[must_use]
    pub fn header_block(&self) -> Vec<u8> {
        format!("From: {}\r\nSubject: {}\r\n\r\n", self.sender, self.subject).into_bytes()
    }
}
