//! Timestamp grammars: the BSD `Mmm dd hh:mm:ss` stamp, which carries no
//! year, and RFC3339.

use std::fmt;

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::cursor::Cursor;
use crate::error::TimestampError;

const MONTHS: [&[u8; 3]; 12] = [
    b"Jan", b"Feb", b"Mar", b"Apr", b"May", b"Jun", b"Jul", b"Aug", b"Sep", b"Oct", b"Nov",
    b"Dec",
];

/// Supplies the year a Stamp timestamp does not carry.
pub trait YearOperator: fmt::Debug + Send + Sync {
    fn year(&self) -> i32;
}

/// Always the same year.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedYear(pub i32);

impl YearOperator for FixedYear {
    fn year(&self) -> i32 {
        self.0
    }
}

/// The current UTC calendar year, read at parse time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CurrentYear;

impl YearOperator for CurrentYear {
    fn year(&self) -> i32 {
        Utc::now().year()
    }
}

/// The current UTC calendar year shifted by a number of years, e.g. `-1`
/// when replaying last year's archives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearOffset(pub i32);

impl YearOperator for YearOffset {
    fn year(&self) -> i32 {
        Utc::now().year().saturating_add(self.0)
    }
}

/// A zone to interpret naive timestamps in, or to convert them to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timezone {
    Utc,
    Local,
    Fixed(FixedOffset),
    /// An IANA zone such as `Europe/Berlin`, DST rules included.
    Named(Tz),
}

impl Timezone {
    /// Attach this zone to a wall clock time. Returns `None` when the time
    /// falls into a gap, e.g. a DST transition. Ambiguous times resolve to the
    /// earlier instant.
    pub fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Timezone::Utc => Some(Utc.from_utc_datetime(naive).fixed_offset()),
            Timezone::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Timezone::Fixed(offset) => offset.from_local_datetime(naive).single(),
            Timezone::Named(tz) => tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        }
    }

    /// Express the same instant in this zone.
    pub fn convert(&self, dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            Timezone::Utc => dt.with_timezone(&Utc).fixed_offset(),
            Timezone::Local => dt.with_timezone(&Local).fixed_offset(),
            Timezone::Fixed(offset) => dt.with_timezone(offset),
            Timezone::Named(tz) => dt.with_timezone(tz).fixed_offset(),
        }
    }
}

/// Where a Stamp timestamp stopped matching, and why if the shape was right
/// but a value was not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StampMismatch {
    pub(crate) offset: usize,
    pub(crate) cause: Option<TimestampError>,
}

impl StampMismatch {
    fn at(offset: usize) -> Self {
        Self {
            offset,
            cause: None,
        }
    }

    fn invalid(offset: usize, cause: TimestampError) -> Self {
        Self {
            offset,
            cause: Some(cause),
        }
    }
}

fn expect_digit(cursor: &mut Cursor<'_>) -> Result<u32, StampMismatch> {
    match cursor.peek() {
        Some(ch) if ch.is_ascii_digit() => {
            cursor.bump();
            Ok((ch - b'0') as u32)
        }
        _ => Err(StampMismatch::at(cursor.pos())),
    }
}

fn expect_byte(cursor: &mut Cursor<'_>, expected: u8) -> Result<(), StampMismatch> {
    if cursor.eat(expected) {
        Ok(())
    } else {
        Err(StampMismatch::at(cursor.pos()))
    }
}

fn expect_two_digits(cursor: &mut Cursor<'_>) -> Result<u32, StampMismatch> {
    let tens = expect_digit(cursor)?;
    let ones = expect_digit(cursor)?;
    Ok(tens * 10 + ones)
}

/// Parse `Mmm dd hh:mm:ss` at the cursor, completing it with `year`.
///
/// The day may be space padded (`Dec  2`), zero padded (`Dec 02`) or bare
/// (`Dec 2`).
pub(crate) fn parse_stamp(
    cursor: &mut Cursor<'_>,
    year: i32,
) -> Result<NaiveDateTime, StampMismatch> {
    // Narrow the candidate months one byte at a time so a mismatch is
    // reported where it happens.
    let mut month = 0;
    for i in 0..3 {
        let ch = cursor.peek();
        match MONTHS
            .iter()
            .position(|name| name[..i] == MONTHS[month][..i] && Some(name[i]) == ch)
        {
            Some(found) => {
                month = found;
                cursor.bump();
            }
            None => return Err(StampMismatch::at(cursor.pos())),
        }
    }
    let month = month as u32 + 1;
    expect_byte(cursor, b' ')?;

    let day_start = cursor.pos();
    let day = if cursor.eat(b' ') {
        expect_digit(cursor)?
    } else {
        let first = expect_digit(cursor)?;
        match cursor.peek() {
            Some(ch) if ch.is_ascii_digit() => {
                cursor.bump();
                first * 10 + (ch - b'0') as u32
            }
            _ => first,
        }
    };
    expect_byte(cursor, b' ')?;

    let hour_start = cursor.pos();
    let hour = expect_two_digits(cursor)?;
    expect_byte(cursor, b':')?;
    let minute_start = cursor.pos();
    let minute = expect_two_digits(cursor)?;
    expect_byte(cursor, b':')?;
    let second_start = cursor.pos();
    let second = expect_two_digits(cursor)?;

    if !(1..=31).contains(&day) {
        return Err(StampMismatch::invalid(day_start, TimestampError::OutOfRangeDay));
    }
    if hour > 23 {
        return Err(StampMismatch::invalid(hour_start, TimestampError::OutOfRangeHour));
    }
    if minute > 59 {
        return Err(StampMismatch::invalid(
            minute_start,
            TimestampError::OutOfRangeMinute,
        ));
    }
    if second > 59 {
        return Err(StampMismatch::invalid(
            second_start,
            TimestampError::OutOfRangeSecond,
        ));
    }

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or(StampMismatch::invalid(day_start, TimestampError::OutOfRangeDay))
}

/// Read `n` ASCII digits starting at `at`.
#[inline]
fn digits(buf: &[u8], at: usize, n: usize) -> Result<u32, TimestampError> {
    let slice = buf.get(at..at + n).ok_or(TimestampError::TooShort)?;
    slice.iter().try_fold(0u32, |acc, ch| {
        if ch.is_ascii_digit() {
            Ok(acc * 10 + (ch - b'0') as u32)
        } else {
            Err(TimestampError::InvalidDigit)
        }
    })
}

#[inline]
fn separator(buf: &[u8], at: usize, allowed: &[u8], err: TimestampError) -> Result<(), TimestampError> {
    match buf.get(at) {
        Some(ch) if allowed.contains(ch) => Ok(()),
        Some(_) => Err(err),
        None => Err(TimestampError::TooShort),
    }
}

fn days_in_month(year: i32, month: u32) -> Result<u32, TimestampError> {
    // calculate the maximum number of days in the month, accounting for leap
    // years in the gregorian calendar
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => return Err(TimestampError::OutOfRangeMonth),
    };

    Ok(days)
}

/// Parse a complete RFC3339 `date-time`, e.g. `2003-10-11T22:14:15.003Z`.
///
/// `buf` must hold exactly the timestamp; trailing bytes are an error.
pub fn parse_rfc3339(buf: &[u8]) -> Result<DateTime<FixedOffset>, TimestampError> {
    // 20 is the length of `1990-12-31T23:59:59Z`
    if buf.len() < 20 {
        return Err(TimestampError::TooShort);
    }

    let year = digits(buf, 0, 4)? as i32;
    separator(buf, 4, b"-", TimestampError::InvalidCharDateSep)?;
    let month = digits(buf, 5, 2)?;
    separator(buf, 7, b"-", TimestampError::InvalidCharDateSep)?;
    let day = digits(buf, 8, 2)?;

    if day < 1 || day > days_in_month(year, month)? {
        return Err(TimestampError::OutOfRangeDay);
    }

    separator(buf, 10, b"Tt", TimestampError::InvalidCharDateTimeSep)?;

    let hour = digits(buf, 11, 2)?;
    if hour > 23 {
        return Err(TimestampError::OutOfRangeHour);
    }
    separator(buf, 13, b":", TimestampError::InvalidCharTimeSep)?;
    let minute = digits(buf, 14, 2)?;
    if minute > 59 {
        return Err(TimestampError::OutOfRangeMinute);
    }
    separator(buf, 16, b":", TimestampError::InvalidCharTimeSep)?;
    let second = digits(buf, 17, 2)?;
    if second > 59 {
        return Err(TimestampError::OutOfRangeSecond);
    }

    let mut position = 19;
    let mut nanos = 0u32;
    if buf.get(position) == Some(&b'.') {
        position += 1;
        let mut count = 0u32;
        while let Some(ch) = buf.get(position).filter(|c| c.is_ascii_digit()) {
            if count == 9 {
                return Err(TimestampError::SecondFractionTooLong);
            }
            nanos = nanos * 10 + (ch - b'0') as u32;
            count += 1;
            position += 1;
        }
        if count == 0 {
            return Err(TimestampError::SecondFractionMissing);
        }
        nanos *= 10u32.pow(9 - count);
    }

    let offset = match buf.get(position) {
        Some(b'Z') | Some(b'z') => {
            position += 1;
            0
        }
        Some(sign @ (b'+' | b'-')) => {
            let sign = if *sign == b'-' { -1 } else { 1 };
            let h = digits(buf, position + 1, 2).map_err(|_| TimestampError::InvalidCharTzHour)?;
            separator(buf, position + 3, b":", TimestampError::InvalidCharTzMinute)?;
            let m = digits(buf, position + 4, 2).map_err(|_| TimestampError::InvalidCharTzMinute)?;
            if h > 23 || m > 59 {
                return Err(TimestampError::OutOfRangeTimezone);
            }
            position += 6;
            sign * (h * 3600 + m * 60) as i32
        }
        _ => return Err(TimestampError::InvalidCharTzSign),
    };

    if position != buf.len() {
        return Err(TimestampError::ExtraCharacters);
    }

    let offset = FixedOffset::east_opt(offset).ok_or(TimestampError::OutOfRangeTimezone)?;
    let datetime = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(TimestampError::OutOfRangeDay)?
        .and_hms_nano_opt(hour, minute, second, nanos)
        .ok_or(TimestampError::OutOfRangeSecond)?;

    offset
        .from_local_datetime(&datetime)
        .single()
        .ok_or(TimestampError::OutOfRangeTimezone)
}
