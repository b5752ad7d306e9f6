//! The per-delivery session state machine.
//!
//! One [`Session`] exists per alert delivery attempt. It is driven by a
//! single task through repeated write/read cycles: the write phase sends
//! the command(s) for the current stage, the read phase collects one
//! reply, and the transition table picks the next stage. Stages advance
//! strictly forward; any unexpected reply or I/O failure is recorded and
//! the next write phase tears the session down instead of sending, so
//! every protocol failure exits through one code path.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{self, MAX_REPLY_BUFFER, READ_CHUNK, Scan};
use crate::types::{Message, Reply};

/// End-of-data marker closing the message text.
const END_OF_DATA: &[u8] = b".\r\n";

/// Protocol step of a session.
///
/// The ordering of the variants is the ordering of the protocol: a
/// session only ever moves to a later stage, or jumps to [`Stage::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Waiting for the relay's 220 banner; nothing is sent first.
    Connect,
    /// HELO sent, 250 expected.
    Helo,
    /// MAIL FROM sent, 250 expected.
    MailFrom,
    /// RCPT TO sent for the recipient at the cursor, 250 expected.
    /// The stage repeats until the recipient list is exhausted.
    RcptTo,
    /// DATA sent, 354 expected.
    Data,
    /// Headers, body and end-of-data marker sent, 250 expected.
    Body,
    /// QUIT sent; any reply (or a close) is terminal.
    Quit,
    /// A failure was recorded; the next write cycle tears down.
    Failed,
}

/// One in-flight alert delivery, from banner wait through teardown.
#[derive(Debug)]
pub struct Session {
    stage: Stage,
    buffer: BytesMut,
    message: Message,
    helo_host: String,
    cursor: usize,
    failure: Option<Error>,
}

impl Session {
    /// Creates a session for `message`, greeting the relay as `helo_host`.
    #[must_use]
    pub fn new(message: Message, helo_host: &str) -> Self {
        Self {
            stage: Stage::Connect,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            message,
            helo_host: helo_host.to_string(),
            cursor: 0,
            failure: None,
        }
    }

    /// Current protocol stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Number of recipients the relay has accepted so far.
    #[must_use]
    pub const fn recipients_accepted(&self) -> usize {
        self.cursor
    }

    /// Drives the session over `stream` to a terminal outcome.
    ///
    /// Consumes the session: the socket, the receive buffer and the
    /// owned message copies are all released exactly once when this
    /// returns, on every exit path. Each read and write is bounded by
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the first failure recorded during the session: an I/O
    /// error or timeout, a closed connection, a reply overflowing the
    /// receive buffer, or an unexpected status code.
    pub async fn drive<S>(mut self, mut stream: S, timeout: Duration) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            // Write phase. A recorded failure funnels through here
            // instead of being acted on where it was detected.
            if self.stage == Stage::Failed {
                return Err(self.failure.take().unwrap_or(Error::Closed));
            }

            for payload in self.to_send() {
                if let Err(e) = write_all_timed(&mut stream, &payload, timeout).await {
                    // The remaining writes of this phase and the read
                    // are still attempted; teardown happens on the next
                    // write cycle.
                    warn!(stage = ?self.stage, error = %e, "write to relay failed");
                    self.record_failure(e);
                }
            }

            // Read phase.
            let reply = match self.read_reply(&mut stream, timeout).await {
                Ok(reply) => reply,
                Err(Error::Closed) if self.stage == Stage::Quit => {
                    debug!("relay closed without a goodbye");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            if self.stage == Stage::Quit {
                debug!(code = reply.code, "quit acknowledged");
                return Ok(());
            }

            self.apply(&reply);
        }
    }

    /// Produces the byte payloads to write for the current stage, in
    /// order. Empty for the banner wait and for a failed session.
    fn to_send(&self) -> Vec<Vec<u8>> {
        match self.stage {
            Stage::Connect | Stage::Failed => Vec::new(),
            Stage::Helo => vec![
                Command::Helo {
                    hostname: self.helo_host.clone(),
                }
                .serialize(),
            ],
            Stage::MailFrom => vec![
                Command::MailFrom {
                    sender: self.message.sender.clone(),
                }
                .serialize(),
            ],
            // The RCPT TO command is sent once per recipient, always for
            // the recipient at the cursor; the cursor advances only when
            // the relay confirms.
            Stage::RcptTo => vec![
                Command::RcptTo {
                    recipient: self.message.recipients[self.cursor].clone(),
                }
                .serialize(),
            ],
            Stage::Data => vec![Command::Data.serialize()],
            Stage::Body => vec![
                self.message.header_block(),
                format!("{}\r\n", self.message.body).into_bytes(),
                END_OF_DATA.to_vec(),
            ],
            Stage::Quit => vec![Command::Quit.serialize()],
        }
    }

    /// Applies the transition table to one reply.
    fn apply(&mut self, reply: &Reply) {
        let next = match (self.stage, reply.code) {
            (Stage::Connect, 220) => Stage::Helo,
            (Stage::Helo, 250) => Stage::MailFrom,
            (Stage::MailFrom, 250) => self.next_recipient_stage(),
            (Stage::RcptTo, 250) => {
                self.cursor += 1;
                debug!(accepted = self.cursor, "recipient accepted");
                self.next_recipient_stage()
            }
            (Stage::Data, 354) => Stage::Body,
            (Stage::Body, 250) => {
                info!("alert mail accepted by relay");
                Stage::Quit
            }
            (Stage::Quit | Stage::Failed, _) => return,
            (stage, code) => {
                warn!(?stage, code, reply = %reply.text, "unexpected reply from relay");
                self.record_failure(Error::protocol(stage, reply.text.clone()));
                return;
            }
        };

        debug_assert!(next >= self.stage);
        if next != self.stage {
            debug!(from = ?self.stage, to = ?next, code = reply.code, "stage advanced");
        }
        self.stage = next;
    }

    /// Stage after a confirmed sender or recipient: another RCPT TO while
    /// recipients remain, DATA once the cursor passes the end of the list.
    fn next_recipient_stage(&self) -> Stage {
        if self.cursor < self.message.recipients.len() {
            Stage::RcptTo
        } else {
            Stage::Data
        }
    }

    /// Records the first failure and jumps to [`Stage::Failed`].
    fn record_failure(&mut self, error: Error) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
        self.stage = Stage::Failed;
    }

    /// Collects one complete reply, reading more data as needed.
    ///
    /// Bytes past the reply's final line stay in the buffer for the next
    /// call. The buffer never grows past [`MAX_REPLY_BUFFER`]; hitting
    /// the cap without a complete line is fatal.
    async fn read_reply<S>(&mut self, stream: &mut S, timeout: Duration) -> Result<Reply>
    where
        S: AsyncRead + Unpin,
    {
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            match parser::scan(&self.buffer) {
                Scan::Complete { code, consumed } => {
                    let text = String::from_utf8_lossy(&self.buffer[..consumed])
                        .trim_end()
                        .to_string();
                    self.buffer.advance(consumed);
                    return Ok(Reply::new(code, text));
                }
                Scan::Partial { discard } => {
                    self.buffer.advance(discard);

                    if self.buffer.len() >= MAX_REPLY_BUFFER {
                        warn!(stage = ?self.stage, "relay reply overflowed the receive buffer");
                        return Err(Error::BufferOverflow);
                    }

                    let room = (MAX_REPLY_BUFFER - self.buffer.len()).min(READ_CHUNK);
                    match tokio::time::timeout(timeout, stream.read(&mut chunk[..room])).await {
                        Ok(Ok(0)) => {
                            warn!(stage = ?self.stage, "relay closed the connection");
                            return Err(Error::Closed);
                        }
                        Ok(Ok(n)) => self.buffer.extend_from_slice(&chunk[..n]),
                        Ok(Err(e)) => {
                            warn!(stage = ?self.stage, error = %e, "read from relay failed");
                            return Err(Error::Io(e));
                        }
                        Err(_) => {
                            warn!(stage = ?self.stage, "timed out waiting for relay reply");
                            return Err(Error::Timeout(timeout));
                        }
                    }
                }
            }
        }
    }
}

async fn write_all_timed<S>(stream: &mut S, payload: &[u8], timeout: Duration) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    match tokio::time::timeout(timeout, stream.write_all(payload)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::Io(e)),
        Err(_) => Err(Error::Timeout(timeout)),
    }
}
