//! Incremental SMTP reply scanner.
//!
//! Replies accumulate in a session-owned byte buffer as the socket
//! delivers them, in arbitrary fragments. [`scan`] inspects whatever has
//! arrived so far and either extracts the status code of one complete
//! reply or reports how much scanned continuation prefix may be dropped
//! while waiting for more data.
//!
//! SMTP replies can be single-line or multi-line:
//! - Single: `250 OK\r\n`
//! - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
//!
//! Continuation lines carry `-` as their fourth byte and never decide a
//! reply's status; only the final line's leading three bytes do.

/// Hard cap on unconsumed reply bytes; exceeding it is fatal for the
/// session, not a truncation.
pub const MAX_REPLY_BUFFER: usize = 1024;

/// Upper bound on a single socket read while collecting a reply.
pub const READ_CHUNK: usize = 512;

/// Outcome of scanning the accumulated receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// A full reply is present.
    Complete {
        /// Decoded three-digit status code.
        code: u16,
        /// Bytes to consume from the front of the buffer, through the
        /// final line's terminator. Anything after them belongs to the
        /// next reply and must be retained.
        consumed: usize,
    },
    /// No terminated final line yet; more data is required.
    Partial {
        /// Length of the already-scanned continuation prefix, safe to
        /// drop from the front of the buffer before reading more.
        discard: usize,
    },
}

/// Scans `buf` for one complete reply.
///
/// Continuation lines are skipped without extracting a code. The first
/// non-continuation line's leading three bytes decode as a decimal
/// status code with no further validation: malformed bytes produce a
/// nonsensical but well-defined integer, which the state machine then
/// rejects like any other unexpected code.
#[must_use]
pub fn scan(buf: &[u8]) -> Scan {
    let mut start = 0;

    while let Some(pos) = find_crlf(&buf[start..]) {
        let line = &buf[start..start + pos];

        if line.len() >= 4 && line[3] == b'-' {
            start += pos + 2;
            continue;
        }

        return Scan::Complete {
            code: decode_code(line),
            consumed: start + pos + 2,
        };
    }

    Scan::Partial { discard: start }
}

/// Finds the position of the first CRLF in `buf`.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Decodes the leading three bytes of a line as a decimal status code.
///
/// Missing bytes read as NUL, matching the behavior of scanning past a
/// short line's terminator.
fn decode_code(line: &[u8]) -> u16 {
    let digit = |i: usize| u16::from(line.get(i).copied().unwrap_or(0).wrapping_sub(b'0'));
    digit(0) * 100 + digit(1) * 10 + digit(2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_reply() {
        assert_eq!(
            scan(b"250 OK\r\n"),
            Scan::Complete {
                code: 250,
                consumed: 8
            }
        );
    }

    #[test]
    fn test_greeting_reply() {
        let buf = b"220 mail.example.com ESMTP ready\r\n";
        assert_eq!(
            scan(buf),
            Scan::Complete {
                code: 220,
                consumed: buf.len()
            }
        );
    }

    #[test]
    fn test_multi_line_reply_takes_final_code() {
        let buf = b"250-mail.example.com\r\n250-SIZE 10240000\r\n251 done\r\n";
        // Continuation lines are skipped; only the final line decides.
        assert_eq!(
            scan(buf),
            Scan::Complete {
                code: 251,
                consumed: buf.len()
            }
        );
    }

    #[test]
    fn test_trailing_bytes_are_retained() {
        let buf = b"354 go ahead\r\n250 next reply";
        assert_eq!(
            scan(buf),
            Scan::Complete {
                code: 354,
                consumed: 14
            }
        );
    }

    #[test]
    fn test_empty_buffer_is_partial() {
        assert_eq!(scan(b""), Scan::Partial { discard: 0 });
    }

    #[test]
    fn test_unterminated_line_is_partial() {
        assert_eq!(scan(b"250 still com"), Scan::Partial { discard: 0 });
    }

    #[test]
    fn test_partial_after_continuations_discards_prefix() {
        let buf = b"250-first\r\n250-second\r\n250 unfinis";
        assert_eq!(scan(buf), Scan::Partial { discard: 23 });
    }

    #[test]
    fn test_bare_code_line() {
        // Shorter than four bytes: cannot be a continuation line.
        assert_eq!(
            scan(b"220\r\n"),
            Scan::Complete {
                code: 220,
                consumed: 5
            }
        );
    }

    #[test]
    fn test_garbage_code_is_defined() {
        // Non-digits decode to some integer; the state machine rejects it.
        let Scan::Complete { code, consumed } = scan(b"abc nonsense\r\n") else {
            panic!("expected a complete reply");
        };
        assert_eq!(consumed, 14);
        assert_ne!(code, 250);
    }

    #[test]
    fn test_empty_line_is_complete() {
        let Scan::Complete { consumed, .. } = scan(b"\r\n") else {
            panic!("expected a complete reply");
        };
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_lone_cr_is_partial() {
        assert_eq!(scan(b"250 OK\r"), Scan::Partial { discard: 0 });
    }

    mod fragmentation {
        use bytes::{Buf, BytesMut};
        use proptest::prelude::*;

        use super::super::{Scan, scan};

        /// Feeds `response` into a compacting buffer chunk by chunk, the
        /// way a session's read loop does, and returns the first
        /// extracted code plus the bytes left buffered once the whole
        /// response has arrived.
        fn feed_in_chunks(response: &[u8], breaks: &[usize]) -> (u16, Vec<u8>) {
            let mut buffer = BytesMut::new();
            let mut chunks = Vec::new();
            let mut start = 0;
            for &b in breaks {
                chunks.push(&response[start..b]);
                start = b;
            }
            chunks.push(&response[start..]);

            let mut found = None;
            for chunk in chunks {
                buffer.extend_from_slice(chunk);
                if found.is_none() {
                    match scan(&buffer) {
                        Scan::Complete { code, consumed } => {
                            buffer.advance(consumed);
                            found = Some(code);
                        }
                        Scan::Partial { discard } => buffer.advance(discard),
                    }
                }
            }
            match found {
                Some(code) => (code, buffer.to_vec()),
                None => panic!("response never produced a complete reply"),
            }
        }

        fn response_and_breaks() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
            prop_oneof![
                Just(&b"250 OK\r\n"[..]),
                Just(&b"220 mail.example.com ESMTP ready\r\n"[..]),
                Just(&b"250-mail.example.com\r\n250-SIZE 10240000\r\n250 HELP\r\n"[..]),
                Just(&b"354 go ahead\r\n250 trailing reply\r\n"[..]),
            ]
            .prop_flat_map(|resp| {
                let len = resp.len();
                (
                    Just(resp.to_vec()),
                    prop::collection::btree_set(1..len, 0..5)
                        .prop_map(|set| set.into_iter().collect::<Vec<_>>()),
                )
            })
        }

        proptest! {
            // Any partition of the response into read chunks extracts
            // the same code and leaves the same remainder as one read.
            #[test]
            fn scan_is_fragmentation_invariant((response, breaks) in response_and_breaks()) {
                let whole = feed_in_chunks(&response, &[]);
                let split = feed_in_chunks(&response, &breaks);
                prop_assert_eq!(whole, split);
            }
        }
    }
}
