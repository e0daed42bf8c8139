//! Tokenizer for octet-counted syslog streams (RFC5425/RFC6587):
//!
//! ```text
//! MSGLEN SP SYSLOG-MSG MSGLEN SP SYSLOG-MSG ...
//! ```
//!
//! `MSGLEN` is the number of octets, not characters, in the following
//! `SYSLOG-MSG`.

use std::fmt;
use std::io::{self, BufRead};

use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    MsgLen,
    Ws,
    SyslogMsg,
    Eof,
    Illegal,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::MsgLen => "MSGLEN",
            TokenKind::Ws => "WS",
            TokenKind::SyslogMsg => "SYSLOGMSG",
            TokenKind::Eof => "EOF",
            TokenKind::Illegal => "ILLEGAL",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Vec<u8>,
}

impl Token {
    fn new(kind: TokenKind, literal: Vec<u8>) -> Self {
        Self { kind, literal }
    }
}

/// Length of the UTF-8 sequence a byte starts. Continuation and invalid
/// bytes count as one.
#[inline]
fn utf8_width(lead: u8) -> usize {
    match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    }
}

/// Splits a byte stream into `MSGLEN`, `WS` and `SYSLOGMSG` tokens.
///
/// After a `MSGLEN` followed by `WS`, the next token is a `SYSLOGMSG` of
/// exactly the announced number of octets. If the stream ends first, an
/// `EOF` token carrying the partial body is returned instead.
pub struct Scanner<R> {
    reader: R,
    /// Octets consumed from the stream so far.
    offset: u64,
    /// Length announced by the last `MSGLEN`, until its body is read.
    msglen: Option<u64>,
    ready: bool,
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            msglen: None,
            ready: false,
        }
    }

    /// Octets consumed from the underlying reader.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The length announced by the most recent `MSGLEN` token.
    pub fn msglen(&self) -> Option<u64> {
        self.msglen
    }

    fn fill(&mut self) -> io::Result<&[u8]> {
        loop {
            match self.reader.fill_buf() {
                Ok(_) => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        self.reader.fill_buf()
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        Ok(self.fill()?.first().copied())
    }

    fn read(&mut self) -> io::Result<Option<u8>> {
        let ch = self.peek()?;
        if ch.is_some() {
            self.reader.consume(1);
            self.offset += 1;
        }
        Ok(ch)
    }

    pub fn scan(&mut self) -> io::Result<Token> {
        if self.ready {
            self.ready = false;
            let len = self.msglen.take().unwrap_or_default();
            return self.scan_syslog_msg(len);
        }

        match self.peek()? {
            None => Ok(Token::new(TokenKind::Eof, Vec::new())),
            Some(b'1'..=b'9') => self.scan_msglen(),
            Some(b' ') => {
                self.read()?;
                self.ready = self.msglen.is_some();
                Ok(Token::new(TokenKind::Ws, vec![b' ']))
            }
            Some(ch) => {
                self.read()?;
                self.msglen = None;
                Ok(Token::new(TokenKind::Illegal, vec![ch]))
            }
        }
    }

    fn scan_msglen(&mut self) -> io::Result<Token> {
        let mut literal = Vec::with_capacity(8);
        let mut len: Option<u64> = Some(0);
        while let Some(ch) = self.peek()? {
            if !ch.is_ascii_digit() {
                break;
            }
            self.read()?;
            literal.push(ch);
            len = len
                .and_then(|n| n.checked_mul(10))
                .and_then(|n| n.checked_add((ch - b'0') as u64));
        }

        match len {
            Some(len) => {
                self.msglen = Some(len);
                Ok(Token::new(TokenKind::MsgLen, literal))
            }
            // does not fit in 64 bits
            None => {
                self.msglen = None;
                Ok(Token::new(TokenKind::Illegal, literal))
            }
        }
    }

    /// Read exactly `len` octets. The body is walked one UTF-8 sequence at a
    /// time, but only the octet count bounds the loop.
    fn scan_syslog_msg(&mut self, len: u64) -> io::Result<Token> {
        // `len` comes off the wire; don't trust it for the allocation.
        let mut literal = Vec::with_capacity(len.min(64 * 1024) as usize);
        let mut remaining = len;
        let mut runes = 0usize;

        while remaining > 0 {
            let Some(lead) = self.read()? else {
                trace!(expected = len, got = literal.len(), "stream ended inside a frame");
                return Ok(Token::new(TokenKind::Eof, literal));
            };
            literal.push(lead);
            remaining -= 1;

            let width = (utf8_width(lead) as u64).min(remaining + 1);
            for _ in 1..width {
                let Some(ch) = self.read()? else {
                    return Ok(Token::new(TokenKind::Eof, literal));
                };
                literal.push(ch);
                remaining -= 1;
            }
            runes += 1;
        }

        trace!(octets = len, runes, "scanned syslog message");
        Ok(Token::new(TokenKind::SyslogMsg, literal))
    }

    /// Drop bytes up to the next one that could start a `MSGLEN`. Returns how
    /// many were dropped.
    pub fn skip_to_msglen(&mut self) -> io::Result<u64> {
        self.msglen = None;
        self.ready = false;

        let mut skipped = 0;
        while let Some(ch) = self.peek()? {
            if matches!(ch, b'1'..=b'9') {
                break;
            }
            self.read()?;
            skipped += 1;
        }

        Ok(skipped)
    }

    /// Drop the next `len` octets unread. Returns fewer than `len` only if the
    /// stream ended first.
    pub fn discard(&mut self, len: u64) -> io::Result<u64> {
        self.msglen = None;
        self.ready = false;

        let mut discarded = 0;
        while discarded < len {
            let available = self.fill()?.len() as u64;
            if available == 0 {
                break;
            }
            let n = available.min(len - discarded);
            self.reader.consume(n as usize);
            self.offset += n;
            discarded += n;
        }

        trace!(requested = len, discarded, "discarded octets");
        Ok(discarded)
    }
}
