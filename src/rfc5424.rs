//! Parser for [RFC 5424](https://tools.ietf.org/html/rfc5424) syslog
//! messages:
//!
//! ```text
//! <PRI>VERSION TIMESTAMP HOSTNAME APP-NAME PROCID MSGID STRUCTURED-DATA [MSG]
//! ```
//!
//! Header fields may be the NILVALUE `-`. Structured data param values are
//! not unescaped.

use std::borrow::Cow;

use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult, TimestampFormat};
use crate::message::{MessageBuilder, Protocol};
use crate::parser::Parser;
use crate::{priority, timestamp, Error, ProcId, StructuredElement};

const MAX_HOSTNAME: usize = 255;
const MAX_APPNAME: usize = 48;
const MAX_PROCID: usize = 128;
const MAX_MSGID: usize = 32;
const MAX_SD_NAME: usize = 32;

#[inline]
fn is_print_ascii(ch: u8) -> bool {
    (33..=126).contains(&ch)
}

#[inline]
fn is_sd_name_char(ch: u8) -> bool {
    is_print_ascii(ch) && !matches!(ch, b'=' | b']' | b'"')
}

#[inline]
fn text(bytes: &[u8], offset: usize) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(offset))
}

#[inline]
fn expect(cursor: &mut Cursor<'_>, ch: u8, expected: &'static str) -> Result<(), Error> {
    if cursor.eat(ch) {
        Ok(())
    } else {
        Err(Error::Mismatch {
            offset: cursor.pos(),
            expected,
        })
    }
}

/// `-` followed by a space or the end of input.
#[inline]
fn eat_nil(cursor: &mut Cursor<'_>) -> bool {
    if cursor.peek() == Some(b'-') && matches!(cursor.peek_at(1), None | Some(b' ')) {
        cursor.bump();
        true
    } else {
        false
    }
}

/// A header field of 1 to `max` printable characters, or the NILVALUE.
fn header_field<'a>(
    cursor: &mut Cursor<'a>,
    max: usize,
    expected: &'static str,
) -> Result<Option<&'a str>, Error> {
    if eat_nil(cursor) {
        return Ok(None);
    }

    let start = cursor.pos();
    let value = cursor.take_while(max + 1, is_print_ascii);
    if value.is_empty() {
        return Err(Error::Mismatch {
            offset: start,
            expected,
        });
    }
    if value.len() > max {
        return Err(Error::Mismatch {
            offset: start + max,
            expected,
        });
    }

    text(value, start).map(Some)
}

fn version(cursor: &mut Cursor<'_>) -> Result<u32, Error> {
    const EXPECTED: &str = "a protocol version";

    let start = cursor.pos();
    if !matches!(cursor.peek(), Some(b'1'..=b'9')) {
        return Err(Error::Mismatch {
            offset: start,
            expected: EXPECTED,
        });
    }

    let digits = cursor.take_while(3, |c| c.is_ascii_digit());
    if cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
        return Err(Error::Mismatch {
            offset: cursor.pos(),
            expected: EXPECTED,
        });
    }

    Ok(digits
        .iter()
        .fold(0u32, |acc, ch| acc * 10 + (ch - b'0') as u32))
}

fn sd_name<'a>(cursor: &mut Cursor<'a>, expected: &'static str) -> Result<&'a str, Error> {
    let start = cursor.pos();
    let name = cursor.take_while(MAX_SD_NAME + 1, is_sd_name_char);
    if name.is_empty() || name.len() > MAX_SD_NAME {
        return Err(Error::Mismatch {
            offset: start + name.len().min(MAX_SD_NAME),
            expected,
        });
    }

    text(name, start)
}

/// Parse a `param_value`... a.k.a. a quoted string. Escaped quotes do not
/// end the value and are kept as is.
fn param_value<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str, Error> {
    expect(cursor, b'"', "a quoted param value")?;

    cursor.mark();
    let start = cursor.marked();
    let mut escaped = false;
    loop {
        match cursor.peek() {
            None => {
                return Err(Error::Mismatch {
                    offset: cursor.pos(),
                    expected: "a closing quote",
                })
            }
            Some(b'"') if !escaped => break,
            Some(ch) => {
                escaped = !escaped && ch == b'\\';
                cursor.bump();
            }
        }
    }

    let value = text(cursor.since_mark(), start)?;
    cursor.bump();
    Ok(value)
}

// example: [exampleSDID@32473 iut="3" eventSource="Application" eventID="1011"]
fn structured_element<'a>(cursor: &mut Cursor<'a>) -> Result<StructuredElement<'a>, Error> {
    expect(cursor, b'[', "a structured data element")?;
    let id = sd_name(cursor, "an SD-ID")?;

    let mut params = Vec::new();
    loop {
        if cursor.eat(b']') {
            break;
        }

        expect(cursor, b' ', "a space or ']'")?;
        let key = sd_name(cursor, "a param name")?;
        expect(cursor, b'=', "'='")?;
        let value = param_value(cursor)?;
        params.push((Cow::Borrowed(key), Cow::Borrowed(value)));
    }

    Ok(StructuredElement {
        id: Cow::Borrowed(id),
        params,
    })
}

/// RFC5424 parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rfc5424Parser {
    best_effort: bool,
}

impl Rfc5424Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// On failure, return the fields parsed so far along with the error, as
    /// long as at least the priority was parsed.
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }
}

impl Parser for Rfc5424Parser {
    fn parse<'a>(&self, input: &'a [u8]) -> ParseResult<'a> {
        let mut builder = MessageBuilder::new(Protocol::RFC5424(0));
        let mut cursor = Cursor::new(input);

        match parse_into(&mut cursor, &mut builder) {
            Ok(()) => Ok(builder.build()),
            Err(err) if self.best_effort && builder.is_valid() => {
                debug!(%err, "rfc5424 returning partial message");
                Err(ParseError::with_partial(err, builder.build()))
            }
            Err(err) => {
                debug!(%err, "rfc5424 parse failed");
                Err(err.into())
            }
        }
    }
}

fn parse_into<'a>(cursor: &mut Cursor<'a>, builder: &mut MessageBuilder<'a>) -> Result<(), Error> {
    // https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.1
    builder.priority(priority::parse(cursor)?);
    builder.protocol(Protocol::RFC5424(version(cursor)?));
    expect(cursor, b' ', "a space after the version")?;

    if !eat_nil(cursor) {
        let start = cursor.pos();
        cursor.mark();
        cursor.take_while(usize::MAX, |c| c != b' ');
        let ts = timestamp::parse_rfc3339(cursor.since_mark()).map_err(|cause| {
            Error::TimestampMismatch {
                offset: start,
                expected: TimestampFormat::Rfc3339,
                cause: Some(cause),
            }
        })?;
        builder.timestamp(ts);
    }
    expect(cursor, b' ', "a space after the timestamp")?;

    let start = cursor.pos();
    match header_field(cursor, MAX_HOSTNAME, "a hostname") {
        Ok(Some(hostname)) => builder.hostname(Cow::Borrowed(hostname)),
        Ok(None) => {}
        Err(_) => return Err(Error::HostnameInvalid(start)),
    }
    expect(cursor, b' ', "a space after the hostname")?;

    if let Some(appname) = header_field(cursor, MAX_APPNAME, "an app name")? {
        builder.appname(Cow::Borrowed(appname));
    }
    expect(cursor, b' ', "a space after the app name")?;

    if let Some(procid) = header_field(cursor, MAX_PROCID, "a proc id")? {
        builder.procid(ProcId::from(procid));
    }
    expect(cursor, b' ', "a space after the proc id")?;

    if let Some(msgid) = header_field(cursor, MAX_MSGID, "a msg id")? {
        builder.msgid(Cow::Borrowed(msgid));
    }
    expect(cursor, b' ', "a space after the msg id")?;

    if !eat_nil(cursor) {
        loop {
            builder.structured_element(structured_element(cursor)?);
            if cursor.peek() != Some(b'[') {
                break;
            }
        }
    }

    if !cursor.is_eof() {
        expect(cursor, b' ', "a space before the message")?;
        let msg = cursor.take_rest();
        if !msg.is_empty() {
            builder.msg(Cow::Borrowed(msg));
        }
    }

    Ok(())
}

/// Parse an array of bytes into a `Message` object
pub fn parse_message(buf: &[u8]) -> ParseResult<'_> {
    Rfc5424Parser::default().parse(buf)
}
