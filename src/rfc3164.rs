//! Parser for [RFC 3164](https://tools.ietf.org/html/rfc3164) "BSD" syslog
//! messages:
//!
//! ```text
//! <PRI>Mmm dd hh:mm:ss HOSTNAME TAG[PID]: CONTENT
//! ```
//!
//! The input is scanned once, left to right, by a small state machine that
//! walks through the header fields in order. Only two places look ahead: the
//! first byte of the timestamp picks the Stamp or RFC3339 grammar, and the
//! bytes after the tag decide whether the `TAG: ` / `TAG[PID]: ` conventions
//! apply or the rest of the line is plain content.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult, TimestampError, TimestampFormat};
use crate::message::{MessageBuilder, Protocol};
use crate::parser::Parser;
use crate::timestamp::{self, CurrentYear, StampMismatch, Timezone, YearOperator};
use crate::{priority, Error, ProcId};

const MAX_HOSTNAME: usize = 255;
const MAX_TAG: usize = 32;

#[inline]
fn is_hostname_char(ch: u8) -> bool {
    (33..=126).contains(&ch)
}

#[inline]
fn is_tag_char(ch: u8) -> bool {
    is_hostname_char(ch) && ch != b':' && ch != b'['
}

#[inline]
fn is_procid_char(ch: u8) -> bool {
    is_hostname_char(ch) && ch != b']'
}

#[inline]
fn ascii(bytes: &[u8], offset: usize) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(offset))
}

/// RFC3164 parser and its grammar relaxations.
///
/// The parser itself is immutable; every call to [`Parser::parse`] runs a
/// fresh state machine, so a single instance can be shared freely.
///
/// ```
/// use syslog_ingest::rfc3164::Rfc3164Parser;
/// use syslog_ingest::timestamp::FixedYear;
/// use syslog_ingest::Parser;
///
/// let parser = Rfc3164Parser::new().with_year(FixedYear(2023));
/// let msg = parser.parse(b"<13>Dec  2 16:31:03 host app: Test").unwrap();
/// assert_eq!(msg.hostname.as_deref(), Some("host"));
/// assert_eq!(msg.appname.as_deref(), Some("app"));
/// ```
#[derive(Clone, Debug)]
pub struct Rfc3164Parser {
    best_effort: bool,
    allow_skip_pri: bool,
    rfc3339: bool,
    year: Arc<dyn YearOperator>,
    timezone: Option<Timezone>,
    display_timezone: Option<Timezone>,
}

impl Default for Rfc3164Parser {
    fn default() -> Self {
        Self {
            best_effort: false,
            allow_skip_pri: false,
            rfc3339: false,
            year: Arc::new(CurrentYear),
            timezone: None,
            display_timezone: None,
        }
    }
}

impl Rfc3164Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// On failure, return the fields parsed so far along with the error, as
    /// long as at least the priority was parsed.
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    /// Accept messages without a `<PRI>` header.
    pub fn allow_skip_pri(mut self) -> Self {
        self.allow_skip_pri = true;
        self
    }

    /// Accept RFC3339 timestamps in addition to the BSD Stamp format.
    pub fn rfc3339(mut self) -> Self {
        self.rfc3339 = true;
        self
    }

    /// Where Stamp timestamps get their year from. Defaults to [`CurrentYear`].
    pub fn with_year<Y>(mut self, year: Y) -> Self
    where
        Y: YearOperator + 'static,
    {
        self.year = Arc::new(year);
        self
    }

    /// Zone Stamp timestamps are written in. Defaults to UTC.
    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = Some(timezone);
        self
    }

    /// Zone to present Stamp timestamps in, after they were interpreted.
    pub fn with_display_timezone(mut self, timezone: Timezone) -> Self {
        self.display_timezone = Some(timezone);
        self
    }

    fn resolve(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        let ts = self.timezone.unwrap_or(Timezone::Utc).localize(naive)?;
        Some(match self.display_timezone {
            Some(display) => display.convert(ts),
            None => ts,
        })
    }
}

impl Parser for Rfc3164Parser {
    fn parse<'a>(&self, input: &'a [u8]) -> ParseResult<'a> {
        Machine::new(self, input).run()
    }
}

/// Parse with the default configuration: PRI required, Stamp timestamps in
/// UTC completed with the current year, no best effort.
pub fn parse_message(input: &[u8]) -> ParseResult<'_> {
    Rfc3164Parser::default().parse(input)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Priority,
    Timestamp,
    Hostname,
    Tag,
    Message,
    Done,
}

struct Machine<'a, 'p> {
    parser: &'p Rfc3164Parser,
    cursor: Cursor<'a>,
    builder: MessageBuilder<'a>,
}

impl<'a, 'p> Machine<'a, 'p> {
    fn new(parser: &'p Rfc3164Parser, input: &'a [u8]) -> Self {
        Self {
            parser,
            cursor: Cursor::new(input),
            builder: MessageBuilder::new(Protocol::RFC3164),
        }
    }

    fn run(mut self) -> ParseResult<'a> {
        let mut phase = Phase::Priority;
        loop {
            let step = match phase {
                Phase::Priority => self.priority(),
                Phase::Timestamp => self.timestamp(),
                Phase::Hostname => self.hostname(),
                Phase::Tag => self.tag(),
                Phase::Message => self.message(),
                Phase::Done => return Ok(self.builder.build()),
            };

            phase = match step {
                Ok(next) => next,
                Err(err) => return Err(self.fail(phase, err)),
            };
        }
    }

    fn fail(self, phase: Phase, err: Error) -> ParseError<'a> {
        if self.parser.best_effort && self.builder.is_valid() {
            debug!(?phase, %err, "rfc3164 returning partial message");
            ParseError::with_partial(err, self.builder.build())
        } else {
            debug!(?phase, %err, "rfc3164 parse failed");
            err.into()
        }
    }

    fn priority(&mut self) -> Result<Phase, Error> {
        match priority::parse(&mut self.cursor) {
            Ok(pri) => {
                self.builder.priority(pri);
                Ok(Phase::Timestamp)
            }
            Err(_) if self.parser.allow_skip_pri => {
                self.cursor.rewind(0);
                Ok(Phase::Timestamp)
            }
            Err(err) => Err(err),
        }
    }

    fn timestamp(&mut self) -> Result<Phase, Error> {
        let rfc3339 = self.parser.rfc3339;
        let expected = if rfc3339 {
            TimestampFormat::StampOrRfc3339
        } else {
            TimestampFormat::Stamp
        };
        let start = self.cursor.pos();

        // Stamps start with a month name, RFC3339 with the year.
        let ts = if rfc3339 && self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.mark();
            self.cursor.take_while(usize::MAX, |c| c != b' ');
            timestamp::parse_rfc3339(self.cursor.since_mark()).map_err(|cause| {
                Error::TimestampMismatch {
                    offset: start,
                    expected,
                    cause: Some(cause),
                }
            })?
        } else {
            let naive = timestamp::parse_stamp(&mut self.cursor, self.parser.year.year()).map_err(
                |StampMismatch { offset, cause }| Error::TimestampMismatch {
                    offset,
                    expected,
                    cause,
                },
            )?;
            self.parser
                .resolve(&naive)
                .ok_or(Error::TimestampMismatch {
                    offset: start,
                    expected,
                    cause: Some(TimestampError::NonexistentLocalTime),
                })?
        };
        self.builder.timestamp(ts);

        if !self.cursor.eat(b' ') {
            return Err(Error::Mismatch {
                offset: self.cursor.pos(),
                expected: "a space after the timestamp",
            });
        }

        Ok(Phase::Hostname)
    }

    fn hostname(&mut self) -> Result<Phase, Error> {
        let start = self.cursor.pos();
        let host = self.cursor.take_while(MAX_HOSTNAME + 1, is_hostname_char);
        if host.is_empty() {
            return Err(Error::HostnameInvalid(start));
        }
        if host.len() > MAX_HOSTNAME {
            return Err(Error::HostnameInvalid(start + MAX_HOSTNAME));
        }
        if !self.cursor.eat(b' ') {
            return Err(Error::HostnameInvalid(self.cursor.pos()));
        }

        self.builder.hostname(Cow::Borrowed(ascii(host, start)?));
        Ok(Phase::Tag)
    }

    /// Try `TAG: ` and `TAG[PID]: `. When neither applies, step back to where
    /// the tag would have started and let everything be content.
    fn tag(&mut self) -> Result<Phase, Error> {
        self.cursor.mark();
        let start = self.cursor.marked();
        let tag = self.cursor.take_while(usize::MAX, is_tag_char);

        match self.cursor.peek() {
            Some(b':')
                if (1..=MAX_TAG).contains(&tag.len()) && self.cursor.peek_at(1) == Some(b' ') =>
            {
                self.builder.appname(Cow::Borrowed(ascii(tag, start)?));
                self.cursor.bump();
                self.cursor.bump();
            }
            Some(b'[') if tag.len() > MAX_TAG => {
                return Err(Error::TagInvalid(start + MAX_TAG));
            }
            Some(b'[') if !tag.is_empty() => {
                self.builder.appname(Cow::Borrowed(ascii(tag, start)?));

                let open = self.cursor.pos();
                self.cursor.bump();
                let pid = self.cursor.take_while(usize::MAX, is_procid_char);
                let closed = self.cursor.peek() == Some(b']')
                    && self.cursor.peek_at(1) == Some(b':')
                    && self.cursor.peek_at(2) == Some(b' ');
                if !pid.is_empty() && closed {
                    self.builder.procid(ProcId::from(ascii(pid, open + 1)?));
                    // `]: `
                    for _ in 0..3 {
                        self.cursor.bump();
                    }
                } else {
                    // `[...]` without the trailing `: ` belongs to the content
                    self.cursor.rewind(open);
                }
            }
            _ => self.cursor.rewind(start),
        }

        Ok(Phase::Message)
    }

    fn message(&mut self) -> Result<Phase, Error> {
        let rest = self.cursor.take_rest();
        if !rest.is_empty() {
            self.builder.msg(Cow::Borrowed(rest));
        }

        Ok(Phase::Done)
    }
}
