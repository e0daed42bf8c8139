//! The `<PRI>` header and the facility/severity pair it encodes.

use std::fmt;

use crate::cursor::Cursor;
use crate::error::InvalidCode;
use crate::Error;

/// Largest valid PRI: facility 23 * 8 + severity 7.
pub const MAX_PRIORITY: u8 = 191;

/// Syslog facilities. Taken From RFC 5424, names are from Linux.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[allow(non_camel_case_types)]
pub enum Facility {
    KERN = 0,
    USER = 1,
    MAIL = 2,
    DAEMON = 3,
    AUTH = 4,
    SYSLOG = 5,
    LPR = 6,
    NEWS = 7,
    UUCP = 8,
    CRON = 9,
    AUTHPRIV = 10,
    FTP = 11,
    NTP = 12,
    AUDIT = 13,
    ALERT = 14,
    CLOCKD = 15,
    LOCAL0 = 16,
    LOCAL1 = 17,
    LOCAL2 = 18,
    LOCAL3 = 19,
    LOCAL4 = 20,
    LOCAL5 = 21,
    LOCAL6 = 22,
    LOCAL7 = 23,
}

const FACILITIES: [Facility; 24] = [
    Facility::KERN,
    Facility::USER,
    Facility::MAIL,
    Facility::DAEMON,
    Facility::AUTH,
    Facility::SYSLOG,
    Facility::LPR,
    Facility::NEWS,
    Facility::UUCP,
    Facility::CRON,
    Facility::AUTHPRIV,
    Facility::FTP,
    Facility::NTP,
    Facility::AUDIT,
    Facility::ALERT,
    Facility::CLOCKD,
    Facility::LOCAL0,
    Facility::LOCAL1,
    Facility::LOCAL2,
    Facility::LOCAL3,
    Facility::LOCAL4,
    Facility::LOCAL5,
    Facility::LOCAL6,
    Facility::LOCAL7,
];

/// Facility code from the wire. Only 0..=23 exist.
impl TryFrom<u8> for Facility {
    type Error = InvalidCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FACILITIES
            .get(value as usize)
            .copied()
            .ok_or(InvalidCode::Facility(value))
    }
}

impl Facility {
    pub fn as_str(self) -> &'static str {
        match self {
            Facility::KERN => "kern",
            Facility::USER => "user",
            Facility::MAIL => "mail",
            Facility::DAEMON => "daemon",
            Facility::AUTH => "auth",
            Facility::SYSLOG => "syslog",
            Facility::LPR => "lpr",
            Facility::NEWS => "news",
            Facility::UUCP => "uucp",
            Facility::CRON => "cron",
            Facility::AUTHPRIV => "authpriv",
            Facility::FTP => "ftp",
            Facility::NTP => "ntp",
            Facility::AUDIT => "audit",
            Facility::ALERT => "alert",
            Facility::CLOCKD => "clockd",
            Facility::LOCAL0 => "local0",
            Facility::LOCAL1 => "local1",
            Facility::LOCAL2 => "local2",
            Facility::LOCAL3 => "local3",
            Facility::LOCAL4 => "local4",
            Facility::LOCAL5 => "local5",
            Facility::LOCAL6 => "local6",
            Facility::LOCAL7 => "local7",
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syslog Severities from RFC 5424.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum Severity {
    EMERG = 0,
    ALERT = 1,
    CRIT = 2,
    ERR = 3,
    WARNING = 4,
    NOTICE = 5,
    INFO = 6,
    DEBUG = 7,
}

impl TryFrom<u8> for Severity {
    type Error = InvalidCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let severity = match value {
            0 => Severity::EMERG,
            1 => Severity::ALERT,
            2 => Severity::CRIT,
            3 => Severity::ERR,
            4 => Severity::WARNING,
            5 => Severity::NOTICE,
            6 => Severity::INFO,
            7 => Severity::DEBUG,
            _ => return Err(InvalidCode::Severity(value)),
        };

        Ok(severity)
    }
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::EMERG => "emerg",
            Severity::ALERT => "alert",
            Severity::CRIT => "crit",
            Severity::ERR => "err",
            Severity::WARNING => "warning",
            Severity::NOTICE => "notice",
            Severity::INFO => "info",
            Severity::DEBUG => "debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a PRI value into its facility and severity.
///
/// Returns `None` for values above [`MAX_PRIORITY`].
pub fn decode(priority: u8) -> Option<(Facility, Severity)> {
    let facility = Facility::try_from(priority >> 3).ok()?;
    let severity = Severity::try_from(priority & 0x7).ok()?;
    Some((facility, severity))
}

/// Parse `<N>` at the cursor.
///
/// N is 1 to 3 digits without leading zeros, in the range 0-191. Range
/// violations are reported at the first digit that makes the value invalid,
/// a missing bracket at the byte where it was expected.
pub(crate) fn parse(cursor: &mut Cursor<'_>) -> Result<u8, Error> {
    if !cursor.eat(b'<') {
        return Err(Error::PriHeaderMissing(cursor.pos()));
    }

    let mut value: u16 = 0;
    let mut digits = 0;
    while let Some(ch) = cursor.peek() {
        if !ch.is_ascii_digit() {
            break;
        }

        // "0" is only valid on its own
        if digits == 3 || (digits > 0 && value == 0) {
            return Err(Error::PriValueOutOfRange(cursor.pos()));
        }

        value = value * 10 + (ch - b'0') as u16;
        if value > MAX_PRIORITY as u16 {
            return Err(Error::PriValueOutOfRange(cursor.pos()));
        }

        digits += 1;
        cursor.bump();
    }

    if digits == 0 {
        return Err(Error::PriValueOutOfRange(cursor.pos()));
    }

    if !cursor.eat(b'>') {
        return Err(Error::PriHeaderMissing(cursor.pos()));
    }

    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(input: &str) -> Result<(u8, usize), Error> {
        let mut cursor = Cursor::new(input.as_bytes());
        let pri = parse(&mut cursor)?;
        Ok((pri, cursor.pos()))
    }

    #[test]
    fn deref() {
        assert_eq!(Facility::KERN.as_str(), "kern");
        assert_eq!(Facility::LOCAL7.to_string(), "local7");
        assert_eq!(Severity::EMERG.as_str(), "emerg");
        assert_eq!(Severity::ALERT.as_str(), "alert");
        assert_eq!(Severity::CRIT.as_str(), "crit");
        assert_eq!(Severity::ERR.as_str(), "err");
        assert_eq!(Severity::WARNING.as_str(), "warning");
        assert_eq!(Severity::NOTICE.as_str(), "notice");
        assert_eq!(Severity::INFO.as_str(), "info");
        assert_eq!(Severity::DEBUG.to_string(), "debug");
    }

    #[test]
    fn facility_codes() {
        for code in 0..24u8 {
            assert_eq!(Facility::try_from(code).unwrap() as u8, code);
        }
        assert_eq!(Facility::try_from(24), Err(InvalidCode::Facility(24)));
        assert_eq!(Severity::try_from(8), Err(InvalidCode::Severity(8)));
        assert_eq!(
            Facility::try_from(255).unwrap_err().to_string(),
            "255 is not a facility code"
        );
    }

    #[test]
    fn decode_priority() {
        assert_eq!(decode(13), Some((Facility::USER, Severity::NOTICE)));
        assert_eq!(decode(191), Some((Facility::LOCAL7, Severity::DEBUG)));
        assert_eq!(decode(192), None);
    }

    #[test]
    fn valid() {
        assert_eq!(parse_str("<0>").unwrap(), (0, 3));
        assert_eq!(parse_str("<13>Dec").unwrap(), (13, 4));
        assert_eq!(parse_str("<191>").unwrap(), (191, 5));
    }

    #[test]
    fn out_of_range() {
        assert!(matches!(parse_str("<192>"), Err(Error::PriValueOutOfRange(3))));
        assert!(matches!(parse_str("<1923>"), Err(Error::PriValueOutOfRange(3))));
        assert!(matches!(parse_str("<200>"), Err(Error::PriValueOutOfRange(3))));
        assert!(matches!(parse_str("<1000>"), Err(Error::PriValueOutOfRange(4))));
        assert!(matches!(parse_str("<01>"), Err(Error::PriValueOutOfRange(2))));
        assert!(matches!(parse_str("<>"), Err(Error::PriValueOutOfRange(1))));
    }

    #[test]
    fn missing_brackets() {
        assert!(matches!(parse_str("13>"), Err(Error::PriHeaderMissing(0))));
        assert!(matches!(parse_str("<13"), Err(Error::PriHeaderMissing(3))));
        assert!(matches!(parse_str("<13 "), Err(Error::PriHeaderMissing(3))));
        assert!(matches!(parse_str(""), Err(Error::PriHeaderMissing(0))));
    }
}
