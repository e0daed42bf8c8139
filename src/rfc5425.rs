//! Octet-counted framing ([RFC 5425](https://tools.ietf.org/html/rfc5425)
//! section 4.3): splits a byte stream into frames and hands each frame body
//! to an inner message [`Parser`].
//!
//! By default the first malformed frame ends the stream. With
//! [`FrameParser::with_resync`] the parser carries on: the body of a frame
//! rejected for its length is skipped whole, and other garbage is dropped up
//! to the next plausible length prefix.

use std::io::{self, BufRead};

use tracing::{debug, trace, warn};

use crate::error::{Error, ParseError, ParseResult};
use crate::message::Message;
use crate::parser::Parser;
use crate::scanner::{Scanner, Token, TokenKind};

/// One `MSGLEN SP SYSLOG-MSG` frame. `body.len() == length` always holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub length: u64,
    pub body: Vec<u8>,
}

pub struct FrameParser<R, P> {
    scanner: Scanner<R>,
    parser: P,
    max_length: Option<u64>,
    resync: bool,
    done: bool,
}

impl<R: BufRead, P: Parser> FrameParser<R, P> {
    pub fn new(reader: R, parser: P) -> Self {
        Self {
            scanner: Scanner::new(reader),
            parser,
            max_length: None,
            resync: false,
            done: false,
        }
    }

    /// Reject frames announcing more than `max` octets, before reading them.
    pub fn with_max_length(mut self, max: u64) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Keep going after a malformed frame instead of ending the stream.
    pub fn with_resync(mut self, resync: bool) -> Self {
        self.resync = resync;
        self
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Octets consumed from the reader so far.
    pub fn offset(&self) -> u64 {
        self.scanner.offset()
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, Error> {
        let offset = self.scanner.offset();
        let token = self.scanner.scan()?;
        if token.kind != expected {
            return Err(Error::FrameTokenMismatch {
                offset,
                expected,
                found: token.kind,
            });
        }

        Ok(token)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        let offset = self.scanner.offset();
        let token = self.scanner.scan()?;
        match token.kind {
            TokenKind::Eof => return Ok(None),
            TokenKind::MsgLen => {}
            found => {
                return Err(Error::FrameTokenMismatch {
                    offset,
                    expected: TokenKind::MsgLen,
                    found,
                })
            }
        }

        let length = self.scanner.msglen().unwrap_or_default();
        if let Some(max) = self.max_length {
            if length > max {
                return Err(Error::FrameTooLarge { length, max });
            }
        }

        self.expect(TokenKind::Ws)?;

        let token = self.scanner.scan()?;
        match token.kind {
            TokenKind::SyslogMsg => {
                trace!(offset, length, "frame");
                Ok(Some(Frame {
                    length,
                    body: token.literal,
                }))
            }
            _ => Err(Error::FrameIncomplete {
                expected: length,
                got: token.literal.len(),
            }),
        }
    }

    /// Whether the stream can continue after `err`.
    fn recover(&mut self, err: &Error) -> bool {
        if !self.resync {
            return false;
        }

        let skipped = match err {
            Error::FrameTooLarge { length, .. } => self.skip_body(*length),
            Error::FrameTokenMismatch { .. } => self.scanner.skip_to_msglen(),
            _ => return false,
        };

        match skipped {
            Ok(skipped) => {
                warn!(%err, skipped, offset = self.scanner.offset(), "resynchronising stream");
                true
            }
            Err(io) => {
                debug!(%io, "read failed while resynchronising");
                false
            }
        }
    }

    /// Skip the `WS` and `length` octets of a frame whose `MSGLEN` has been
    /// read but whose body is not wanted.
    fn skip_body(&mut self, length: u64) -> io::Result<u64> {
        let token = self.scanner.scan()?;
        if token.kind != TokenKind::Ws {
            let skipped = self.scanner.skip_to_msglen()?;
            return Ok(token.literal.len() as u64 + skipped);
        }

        let discarded = self.scanner.discard(length)?;
        if discarded < length {
            debug!(expected = length, got = discarded, "stream ended inside a skipped frame");
        }
        Ok(1 + discarded)
    }

    /// The next raw frame, or `None` once the stream is exhausted or has been
    /// abandoned after an error.
    pub fn next_frame(&mut self) -> Option<Result<Frame, Error>> {
        if self.done {
            return None;
        }

        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                if !self.recover(&err) {
                    debug!(%err, "stopping stream");
                    self.done = true;
                }
                Some(Err(err))
            }
        }
    }

    /// Parse every frame, handing each result to `f` while the frame body is
    /// still borrowed.
    pub fn run<F>(mut self, mut f: F)
    where
        F: FnMut(ParseResult<'_>),
    {
        while let Some(frame) = self.next_frame() {
            match frame {
                Ok(frame) => f(self.parser.parse(&frame.body)),
                Err(err) => f(Err(err.into())),
            }
        }
    }
}

impl<R: BufRead, P: Parser> Iterator for FrameParser<R, P> {
    type Item = Result<Message<'static>, ParseError<'static>>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.next_frame()? {
            Ok(frame) => self
                .parser
                .parse(&frame.body)
                .map(Message::into_owned)
                .map_err(ParseError::into_owned),
            Err(err) => Err(err.into()),
        };

        Some(item)
    }
}

/// Parse an octet-counted stream, calling `f` once per frame.
///
/// Stops at the end of the stream or at the first malformed frame.
pub fn parse_stream<R, P, F>(reader: R, parser: P, f: F)
where
    R: BufRead,
    P: Parser,
    F: FnMut(ParseResult<'_>),
{
    FrameParser::new(reader, parser).run(f)
}
