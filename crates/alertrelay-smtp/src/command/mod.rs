//! SMTP command builder.
//!
//! Only the commands of the fixed alert-delivery sequence exist here;
//! this is not a general SMTP command set.

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// HELO - Greeting with the local host's name
    Helo {
        /// Local canonical hostname
        hostname: String,
    },
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        sender: String,
    },
    /// RCPT TO - Add one recipient
    RcptTo {
        /// Recipient address
        recipient: String,
    },
    /// DATA - Begin message data
    Data,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command to bytes, CRLF-terminated.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Self::Helo { hostname } => {
                buf.extend_from_slice(b"HELO ");
                buf.extend_from_slice(hostname.as_bytes());
            }
            Self::MailFrom { sender } => {
                buf.extend_from_slice(b"MAIL FROM:<");
                buf.extend_from_slice(sender.as_bytes());
                buf.push(b'>');
            }
            Self::RcptTo { recipient } => {
                buf.extend_from_slice(b"RCPT TO:<");
                buf.extend_from_slice(recipient.as_bytes());
                buf.push(b'>');
            }
            Self::Data => {
                buf.extend_from_slice(b"DATA");
            }
            Self::Quit => {
                buf.extend_from_slice(b"QUIT");
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}
