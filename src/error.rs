use std::fmt;

use thiserror::Error;

use crate::message::Message;
use crate::scanner::TokenKind;

/// Why a timestamp that had the right shape still failed to validate.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum TimestampError {
    #[error("timestamp is too short")]
    TooShort,
    #[error("expected a digit")]
    InvalidDigit,
    #[error("month value is outside the range 1-12")]
    OutOfRangeMonth,
    #[error("day value is outside the range of the month")]
    OutOfRangeDay,
    #[error("hour value is outside the range 0-23")]
    OutOfRangeHour,
    #[error("minute value is outside the range 0-59")]
    OutOfRangeMinute,
    #[error("second value is outside the range 0-59")]
    OutOfRangeSecond,
    #[error("invalid date separator")]
    InvalidCharDateSep,
    #[error("invalid date and time separator")]
    InvalidCharDateTimeSep,
    #[error("invalid time separator")]
    InvalidCharTimeSep,
    #[error("second fraction has no digits")]
    SecondFractionMissing,
    #[error("second fraction is longer than 9 digits")]
    SecondFractionTooLong,
    #[error("missing or invalid timezone offset")]
    InvalidCharTzSign,
    #[error("invalid timezone offset hour")]
    InvalidCharTzHour,
    #[error("invalid timezone offset minute")]
    InvalidCharTzMinute,
    #[error("timezone offset is out of range")]
    OutOfRangeTimezone,
    #[error("unexpected characters after timestamp")]
    ExtraCharacters,
    #[error("local time does not exist in the configured timezone")]
    NonexistentLocalTime,
}

/// A facility or severity code outside the range RFC 5424 defines.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum InvalidCode {
    #[error("{0} is not a facility code")]
    Facility(u8),
    #[error("{0} is not a severity code")]
    Severity(u8),
}

/// The timestamp grammar(s) a parser was prepared to accept.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimestampFormat {
    Stamp,
    StampOrRfc3339,
    Rfc3339,
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimestampFormat::Stamp => "Stamp",
            TimestampFormat::StampOrRfc3339 => "Stamp or RFC3339",
            TimestampFormat::Rfc3339 => "RFC3339",
        })
    }
}

/// Every way parsing can fail. Grammar errors carry the 0-based byte offset
/// at which the mismatch was detected.
#[derive(Debug, Error)]
pub enum Error {
    #[error("expecting a priority value within angle brackets [col {0}]")]
    PriHeaderMissing(usize),
    #[error("expecting a priority value in the range 0-191 [col {0}]")]
    PriValueOutOfRange(usize),
    #[error("expecting a {expected} timestamp [col {offset}]{}", timestamp_cause(.cause))]
    TimestampMismatch {
        offset: usize,
        expected: TimestampFormat,
        cause: Option<TimestampError>,
    },
    #[error("expecting a hostname of 1 to 255 printable US-ASCII characters [col {0}]")]
    HostnameInvalid(usize),
    #[error("expecting an alphanumeric tag of at most 32 characters [col {0}]")]
    TagInvalid(usize),
    #[error("expecting {expected} [col {offset}]")]
    Mismatch {
        offset: usize,
        expected: &'static str,
    },
    #[error("header field is not valid UTF-8 [col {0}]")]
    InvalidUtf8(usize),
    #[error("expecting {expected} but got {found} at stream offset {offset}")]
    FrameTokenMismatch {
        offset: u64,
        expected: TokenKind,
        found: TokenKind,
    },
    #[error("frame declared {expected} octets but the stream ended after {got}")]
    FrameIncomplete { expected: u64, got: usize },
    #[error("frame length {length} exceeds the maximum of {max} octets")]
    FrameTooLarge { length: u64, max: u64 },
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

fn timestamp_cause(cause: &Option<TimestampError>) -> String {
    match cause {
        Some(err) => format!(": {err}"),
        None => String::new(),
    }
}

impl Error {
    /// Byte offset of a grammar mismatch inside a single message, if the
    /// error has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::PriHeaderMissing(offset)
            | Error::PriValueOutOfRange(offset)
            | Error::TimestampMismatch { offset, .. }
            | Error::HostnameInvalid(offset)
            | Error::TagInvalid(offset)
            | Error::Mismatch { offset, .. }
            | Error::InvalidUtf8(offset) => Some(*offset),
            _ => None,
        }
    }
}

/// A failed parse, plus whatever fields were committed before the failure
/// when best-effort parsing is enabled.
#[derive(Debug)]
pub struct ParseError<'a> {
    error: Error,
    partial: Option<Box<Message<'a>>>,
}

pub type ParseResult<'a> = Result<Message<'a>, ParseError<'a>>;

impl<'a> ParseError<'a> {
    pub(crate) fn with_partial(error: Error, partial: Message<'a>) -> Self {
        Self {
            error,
            partial: Some(Box::new(partial)),
        }
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn partial(&self) -> Option<&Message<'a>> {
        self.partial.as_deref()
    }

    pub fn into_parts(self) -> (Error, Option<Message<'a>>) {
        (self.error, self.partial.map(|m| *m))
    }

    pub fn into_owned(self) -> ParseError<'static> {
        ParseError {
            error: self.error,
            partial: self.partial.map(|m| Box::new(m.into_owned())),
        }
    }
}

impl From<Error> for ParseError<'_> {
    fn from(error: Error) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for ParseError<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            Error::PriValueOutOfRange(3).to_string(),
            "expecting a priority value in the range 0-191 [col 3]"
        );
        assert_eq!(
            Error::TimestampMismatch {
                offset: 4,
                expected: TimestampFormat::Stamp,
                cause: None
            }
            .to_string(),
            "expecting a Stamp timestamp [col 4]"
        );
        assert_eq!(
            Error::TimestampMismatch {
                offset: 4,
                expected: TimestampFormat::StampOrRfc3339,
                cause: Some(TimestampError::OutOfRangeMonth)
            }
            .to_string(),
            "expecting a Stamp or RFC3339 timestamp [col 4]: month value is outside the range 1-12"
        );
        assert_eq!(
            Error::FrameTokenMismatch {
                offset: 2,
                expected: TokenKind::Ws,
                found: TokenKind::Illegal
            }
            .to_string(),
            "expecting WS but got ILLEGAL at stream offset 2"
        );
    }

    #[test]
    fn offsets() {
        assert_eq!(Error::HostnameInvalid(20).offset(), Some(20));
        assert_eq!(
            Error::FrameIncomplete {
                expected: 10,
                got: 3
            }
            .offset(),
            None
        );
    }

    #[test]
    fn parse_error_without_partial() {
        let err = ParseError::from(Error::TagInvalid(7));
        assert!(err.partial().is_none());
        assert_eq!(err.error().offset(), Some(7));
        let (error, partial) = err.into_parts();
        assert!(matches!(error, Error::TagInvalid(7)));
        assert!(partial.is_none());
    }
}
