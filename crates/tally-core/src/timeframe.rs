//! Time expression parsing.
//!
//! Turns loosely specified time information such as `-30`, `18:15` or
//! `2014-01-05 18:15 - 2014-04-01 05:19` into a partially specified [`TimeFrame`].
//! Parsing is lenient: unrecognised input yields an empty frame rather than an error,
//! and completion later fills in whatever is missing.
//!
//! # Grammar
//!
//! ```text
//! relative := '-' DIGITS [rest]
//! absolute := [DATE] [pad TIME] [pad '-' [pad DATE] [pad TIME]] [rest]
//! DATE     := YYYY-MM-DD
//! TIME     := HH:MM
//! pad      := '' | ' '
//! ```
//!
//! The first token of an absolute expression must start at the very beginning of the
//! input. A token is only accepted when it is not immediately followed by another digit.
//! If the dash is present but neither an end date nor an end time follows with the
//! allowed padding, everything after the dash is dropped.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, TrackError};

/// Conservative bound for relative offsets (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// A partially specified time range.
///
/// All fields are optional. `offset` (minutes before now) is mutually exclusive with the
/// four absolute fields; the parser never produces a frame that mixes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeFrame {
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub offset: Option<Duration>,
}

impl TimeFrame {
    /// A frame that starts `offset` before now.
    pub fn relative(offset: Duration) -> Self {
        Self {
            offset: Some(offset),
            ..Self::default()
        }
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns true if any of the absolute date/time fields is set.
    pub const fn has_absolute_fields(&self) -> bool {
        self.start_date.is_some()
            || self.start_time.is_some()
            || self.end_date.is_some()
            || self.end_time.is_some()
    }
}

/// Outcome of scanning a piece of text for time information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeInfo<'a> {
    /// The recognised time frame.
    pub frame: TimeFrame,
    /// Leftover text that is not time information, trimmed.
    pub rest: &'a str,
    /// True if a range dash was found but what followed it could not be read.
    pub truncated: bool,
}

/// Parses time information, ignoring anything that is not recognised.
pub fn parse(text: &str) -> TimeFrame {
    scan(text).frame
}

/// Parses time information, failing where [`parse`] would silently drop input.
///
/// Empty input is accepted and yields an empty frame.
pub fn parse_strict(text: &str) -> Result<TimeFrame> {
    let info = scan(text);
    let reason = if info.truncated {
        "unreadable range end after '-'"
    } else if info.rest.is_empty() {
        return Ok(info.frame);
    } else if info.frame.offset.is_some() {
        "unexpected text after relative offset"
    } else {
        "unrecognized text"
    };
    Err(TrackError::ParseAmbiguous {
        input: text.to_string(),
        reason,
    })
}

/// Scans `text` for time information and returns the frame along with the leftover text.
pub fn scan(text: &str) -> TimeInfo<'_> {
    if let Some(info) = scan_relative(text) {
        return info;
    }

    let mut cursor = Cursor::new(text);
    let mut frame = TimeFrame {
        start_date: cursor.date(false),
        ..TimeFrame::default()
    };
    frame.start_time = cursor.time(frame.start_date.is_some());

    if frame.start_date.is_none() && frame.start_time.is_none() {
        return TimeInfo {
            frame,
            rest: text.trim(),
            truncated: false,
        };
    }

    let truncated = if cursor.dash() {
        frame.end_date = cursor.date(true);
        frame.end_time = cursor.time(true);
        frame.end_date.is_none() && frame.end_time.is_none()
    } else {
        // A dash beyond the single allowed space still marks an unreadable range end.
        cursor.rest().trim_start().starts_with('-')
    };

    TimeInfo {
        frame,
        rest: cursor.rest().trim(),
        truncated,
    }
}

fn scan_relative(text: &str) -> Option<TimeInfo<'_>> {
    let body = text.strip_prefix('-')?;
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let minutes: i64 = body[..digits].parse().ok()?;
    if minutes > MAX_RELATIVE_MINUTES {
        return None;
    }
    Some(TimeInfo {
        frame: TimeFrame::relative(Duration::try_minutes(minutes)?),
        rest: body[digits..].trim(),
        truncated: false,
    })
}

/// Byte cursor over ASCII tokens of a time expression.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Tries `read` at the cursor, optionally after a single space.
    ///
    /// `ends` sees the bytes after the token and decides whether the token may stop
    /// there. On success the cursor moves past the token; otherwise it stays put.
    fn token<T>(
        &mut self,
        padded: bool,
        len: usize,
        ends: impl Fn(&[u8]) -> bool,
        read: impl Fn(&[u8]) -> Option<T>,
    ) -> Option<T> {
        let bytes = self.text.as_bytes();
        let mut start = self.pos;
        if padded && bytes.get(start) == Some(&b' ') {
            start += 1;
        }
        let token = bytes.get(start..start + len)?;
        if !ends(&bytes[start + len..]) {
            return None;
        }
        let value = read(token)?;
        self.pos = start + len;
        Some(value)
    }

    /// A date may run straight into a time (`2014-01-0518:15`) but not into other digits.
    fn date(&mut self, padded: bool) -> Option<NaiveDate> {
        let ends = |after: &[u8]| {
            not_digit(after) || after.get(..5).and_then(read_time).is_some()
        };
        self.token(padded, 10, ends, |b| {
            if b[4] != b'-' || b[7] != b'-' {
                return None;
            }
            let year = digits(&b[0..4])?;
            let month = digits(&b[5..7])?;
            let day = digits(&b[8..10])?;
            NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
        })
    }

    fn time(&mut self, padded: bool) -> Option<NaiveTime> {
        self.token(padded, 5, not_digit, read_time)
    }

    fn dash(&mut self) -> bool {
        self.token(true, 1, |_| true, |b| (b[0] == b'-').then_some(()))
            .is_some()
    }
}

fn read_time(b: &[u8]) -> Option<NaiveTime> {
    if b[2] != b':' {
        return None;
    }
    NaiveTime::from_hms_opt(digits(&b[0..2])?, digits(&b[3..5])?, 0)
}

fn not_digit(after: &[u8]) -> bool {
    !after.first().is_some_and(u8::is_ascii_digit)
}

/// Reads a run of ASCII digits as a number; `None` if any byte is not a digit.
fn digits(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0_u32, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}

/// A single, fully typed time value as accepted by [`parse_time_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeValue {
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

/// Parses exactly one of `HH:MM`, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`.
pub fn parse_time_value(text: &str) -> Result<TimeValue> {
    let trimmed = text.trim();
    let ambiguous = |reason| TrackError::ParseAmbiguous {
        input: text.to_string(),
        reason,
    };
    match trimmed.split_whitespace().count() {
        1 => NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map(TimeValue::Time)
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map(TimeValue::Date))
            .map_err(|_| ambiguous("expected HH:MM or YYYY-MM-DD")),
        2 => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
            .map(TimeValue::DateTime)
            .map_err(|_| ambiguous("expected YYYY-MM-DD HH:MM")),
        _ => Err(ambiguous("not a supported time format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn time(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    fn frame(
        start_date: Option<NaiveDate>,
        start_time: Option<NaiveTime>,
        end_date: Option<NaiveDate>,
        end_time: Option<NaiveTime>,
    ) -> TimeFrame {
        TimeFrame {
            start_date,
            start_time,
            end_date,
            end_time,
            offset: None,
        }
    }

    #[test]
    fn empty_and_unrecognized_input_yield_empty_frame() {
        assert!(parse("").is_empty());
        assert!(parse("foobar").is_empty());
        assert!(parse("   ").is_empty());
    }

    #[test]
    fn relative_offset_sets_only_offset() {
        let parsed = parse("-30");
        assert_eq!(parsed, TimeFrame::relative(Duration::minutes(30)));
        assert!(!parsed.has_absolute_fields());
    }

    #[test]
    fn relative_offset_ignores_trailing_absolute_range() {
        let info = scan("-30 2014-01-05 18:15 - 2014-04-01 05:19");
        assert_eq!(info.frame, TimeFrame::relative(Duration::minutes(30)));
        assert_eq!(info.rest, "2014-01-05 18:15 - 2014-04-01 05:19");
    }

    #[test]
    fn dash_without_digits_is_not_relative() {
        let info = scan("-foo");
        assert!(info.frame.is_empty());
        assert_eq!(info.rest, "-foo");
    }

    #[test]
    fn oversized_relative_offset_is_not_recognized() {
        assert!(parse("-99999999999999999999").is_empty());
    }

    #[test]
    fn full_absolute_range() {
        assert_eq!(
            parse("2014-01-05 18:15 - 2014-04-01 05:19"),
            frame(date(2014, 1, 5), time(18, 15), date(2014, 4, 1), time(5, 19))
        );
    }

    #[test]
    fn start_date_with_full_end() {
        assert_eq!(
            parse("2014-01-05 - 2014-04-01 05:19"),
            frame(date(2014, 1, 5), None, date(2014, 4, 1), time(5, 19))
        );
    }

    #[test]
    fn date_range_without_times() {
        assert_eq!(
            parse("2014-01-05 - 2014-04-01"),
            frame(date(2014, 1, 5), None, date(2014, 4, 1), None)
        );
    }

    #[test]
    fn whitespace_around_dash_may_be_omitted() {
        assert_eq!(
            parse("2014-01-05-2014-04-01"),
            frame(date(2014, 1, 5), None, date(2014, 4, 1), None)
        );
        assert_eq!(
            parse("18:15-19:00"),
            frame(None, time(18, 15), None, time(19, 0))
        );
    }

    #[test]
    fn wide_padding_after_dash_drops_the_remainder() {
        let info = scan("2014-01-05 -     2014-04-01");
        assert_eq!(info.frame, frame(date(2014, 1, 5), None, None, None));
        assert!(info.truncated);
    }

    #[test]
    fn wide_padding_before_dash_is_truncated() {
        let info = scan("18:00  - 19:00 coding");
        assert_eq!(info.frame, frame(None, time(18, 0), None, None));
        assert!(info.truncated);
        assert!(parse_strict("18:00  - 19:00 coding").is_err());
    }

    #[test]
    fn date_directly_followed_by_time() {
        assert_eq!(
            parse("2014-01-0518:15"),
            frame(date(2014, 1, 5), time(18, 15), None, None)
        );
        assert_eq!(
            parse("2014-01-0518:15 - 2014-04-0105:19"),
            frame(date(2014, 1, 5), time(18, 15), date(2014, 4, 1), time(5, 19))
        );
        assert_eq!(
            parse("2014-01-0518:155"),
            frame(date(2014, 1, 5), None, None, None)
        );
    }

    #[test]
    fn single_date_or_time() {
        assert_eq!(parse("2014-04-01"), frame(date(2014, 4, 1), None, None, None));
        assert_eq!(parse("18:43"), frame(None, time(18, 43), None, None));
    }

    #[test]
    fn end_without_start_is_not_recognized() {
        assert!(parse(" - 2014-04-01").is_empty());
        assert!(parse("- 2014-04-01").is_empty());
    }

    #[test]
    fn leading_space_prevents_recognition() {
        assert!(parse(" 18:43").is_empty());
    }

    #[test]
    fn tokens_followed_by_digits_are_rejected() {
        assert!(parse("18:437").is_empty());
        assert_eq!(
            parse("2014-01-05 18:155"),
            frame(date(2014, 1, 5), None, None, None)
        );
    }

    #[test]
    fn impossible_dates_and_times_are_not_tokens() {
        assert!(parse("2014-13-45").is_empty());
        assert!(parse("25:61").is_empty());
    }

    #[test]
    fn rest_is_returned_trimmed() {
        let info = scan("18:00-19:30 coding@work, fixing bugs");
        assert_eq!(info.frame, frame(None, time(18, 0), None, time(19, 30)));
        assert_eq!(info.rest, "coding@work, fixing bugs");
        assert!(!info.truncated);
    }

    #[test]
    fn parse_is_pure() {
        let inputs = ["", "-30", "2014-01-05 18:15 - 2014-04-01 05:19", "x", "18:15-"];
        for input in inputs {
            assert_eq!(parse(input), parse(input), "input {input:?}");
        }
    }

    #[test]
    fn strict_accepts_clean_input() {
        assert_eq!(
            parse_strict("2014-01-05 18:15 - 2014-04-01 05:19").unwrap(),
            parse("2014-01-05 18:15 - 2014-04-01 05:19")
        );
        assert!(parse_strict("").unwrap().is_empty());
    }

    #[test]
    fn strict_rejects_relative_with_trailing_text() {
        let err = parse_strict("-30 2014-01-05 18:15 - 2014-04-01 05:19").unwrap_err();
        assert!(matches!(
            err,
            TrackError::ParseAmbiguous {
                reason: "unexpected text after relative offset",
                ..
            }
        ));
    }

    #[test]
    fn strict_rejects_truncated_range() {
        let err = parse_strict("2014-01-05 -     2014-04-01").unwrap_err();
        assert!(matches!(err, TrackError::ParseAmbiguous { .. }));
    }

    #[test]
    fn strict_rejects_unrecognized_text() {
        assert!(parse_strict("foobar").is_err());
    }

    #[test]
    fn time_value_formats() {
        assert_eq!(
            parse_time_value("18:55").unwrap(),
            TimeValue::Time(NaiveTime::from_hms_opt(18, 55, 0).unwrap())
        );
        assert_eq!(
            parse_time_value("2014-12-10").unwrap(),
            TimeValue::Date(NaiveDate::from_ymd_opt(2014, 12, 10).unwrap())
        );
        assert_eq!(
            parse_time_value("2015-10-02 18:12").unwrap(),
            TimeValue::DateTime(
                NaiveDate::from_ymd_opt(2015, 10, 2)
                    .unwrap()
                    .and_hms_opt(18, 12, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn time_value_rejects_malformed_input() {
        for input in ["18 55", "18:555", "2014 01 04 12:30", ""] {
            assert!(parse_time_value(input).is_err(), "input {input:?}");
        }
    }
}
