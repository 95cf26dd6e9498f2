//! English natural-language date and time parser.
//!
//! Handles the phrasings people actually type when booking: relative days
//! ("tomorrow", "next Monday", "in 3 days"), calendar dates ("October 20",
//! "10/20/2026", "2026-10-20") and clock times ("10am", "15:30", "noon").
//! A time is extracted first and its span blanked, then at most one date
//! expression is matched. Anything left over that is not a filler word makes
//! the whole expression unrecognized.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::{Captures, Regex};

use super::DateParser;
use crate::error::TemporalError;

/// Month names and abbreviations the parser accepts, longest first.
pub const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

/// Weekday names and abbreviations the parser accepts, longest first.
pub const WEEKDAYS: &str =
    "monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thur|thu|fri|sat|sun";

const COUNT: &str = r"\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";

const UNITS: &str = "minute|min|hour|hr|day|week|month";

/// Words allowed to remain once the time and date spans are removed.
const FILLER_WORDS: &[&str] = &[
    "at", "on", "the", "of", "for", "around", "about", "by", "please", "and",
];

/// Upper bound on "in N units" so the shifted instant stays representable.
const MAX_RELATIVE_AMOUNT: u32 = 100_000;

/// Default evening hour for "tonight".
const TONIGHT_HOUR: u32 = 20;

// =============================================================================
// Compiled regex sets
// =============================================================================

struct TimePatterns {
    meridiem: Regex,
    clock: Regex,
    oclock: Regex,
    noon: Regex,
    midnight: Regex,
}

static TIME_PATTERNS: LazyLock<TimePatterns> = LazyLock::new(|| TimePatterns {
    meridiem: Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\b\.?").unwrap(),
    clock: Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap(),
    oclock: Regex::new(r"\b(\d{1,2})\s*o'?clock\b").unwrap(),
    noon: Regex::new(r"\b(?:noon|midday)\b").unwrap(),
    midnight: Regex::new(r"\bmidnight\b").unwrap(),
});

struct DatePatterns {
    relative_in: Regex,
    from_now: Regex,
    day_after_tomorrow: Regex,
    tonight: Regex,
    keyword: Regex,
    next_period: Regex,
    iso: Regex,
    numeric: Regex,
    day_month: Regex,
    month_day: Regex,
    weekday: Regex,
}

static DATE_PATTERNS: LazyLock<DatePatterns> = LazyLock::new(|| {
    let mk = |pattern: &str| -> Regex {
        let expanded = pattern
            .replace("MONTH", MONTHS)
            .replace("WEEKDAY", WEEKDAYS)
            .replace("COUNT", COUNT)
            .replace("UNIT", UNITS);
        Regex::new(&expanded).expect("Invalid date regex")
    };

    DatePatterns {
        relative_in: mk(r"\bin\s+(COUNT)\s+(UNIT)s?\b"),
        from_now: mk(r"\b(COUNT)\s+(UNIT)s?\s+from\s+now\b"),
        day_after_tomorrow: mk(r"\b(?:the\s+)?day\s+after\s+tomorrow\b"),
        tonight: mk(r"\btonight\b"),
        keyword: mk(r"\b(now|today|tomorrow|yesterday)\b"),
        next_period: mk(r"\bnext\s+(week|month|year)\b"),
        iso: mk(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"),
        numeric: mk(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b"),
        day_month: mk(r"\b(?:the\s+)?(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?(MONTH)\b(?:,?\s+(\d{4})\b)?"),
        month_day: mk(r"\b(MONTH)\.?\s+(?:the\s+)?(\d{1,2})(?:st|nd|rd|th)?\b(?:,?\s+(\d{4})\b)?"),
        weekday: mk(r"\b(?:(this|next|last|on|coming)\s+)?(WEEKDAY)\b"),
    }
});

// =============================================================================
// Parser
// =============================================================================

/// Date expression resolved against `now`.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    /// A calendar day with no implied time.
    Day(NaiveDate),
    /// An instant whose time is kept unless an explicit time is given.
    Instant(NaiveDateTime),
}

type TimeReader = fn(&Captures<'_>) -> Result<NaiveTime, TemporalError>;
type DateReader = fn(&Captures<'_>, NaiveDateTime) -> Result<Anchor, TemporalError>;

/// Rule-based English date parser. Stateless; share freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishDateParser;

impl EnglishDateParser {
    pub fn new() -> Self {
        Self
    }
}

impl DateParser for EnglishDateParser {
    fn parse(&self, text: &str, now: NaiveDateTime) -> Result<NaiveDateTime, TemporalError> {
        let mut work = text.trim().to_lowercase().replace('\u{2019}', "'");
        if work.is_empty() {
            return Err(TemporalError::Empty);
        }

        let time = take_time(&mut work)?;
        let anchor = take_date(&mut work, now)?;

        if !only_fillers(&work) {
            return Err(TemporalError::Unrecognized(text.trim().to_string()));
        }

        let (date, implied_time) = match anchor {
            Some(Anchor::Day(date)) => (date, None),
            Some(Anchor::Instant(instant)) => (instant.date(), Some(instant.time())),
            None if time.is_some() => (now.date(), None),
            None => return Err(TemporalError::Unrecognized(text.trim().to_string())),
        };

        match time.or(implied_time) {
            Some(time) => Ok(date.and_time(time)),
            None => date.and_hms_opt(0, 0, 0).ok_or(TemporalError::OutOfRange),
        }
    }
}

/// Run `re` against `work`; on a match, read it and blank its span.
fn take<T>(
    work: &mut String,
    re: &Regex,
    read: impl FnOnce(&Captures<'_>) -> Result<T, TemporalError>,
) -> Result<Option<T>, TemporalError> {
    let Some(caps) = re.captures(work.as_str()) else {
        return Ok(None);
    };
    let span = caps.get(0).map_or(0..0, |m| m.range());
    let value = read(&caps)?;
    drop(caps);
    work.replace_range(span.clone(), &" ".repeat(span.len()));
    Ok(Some(value))
}

fn take_time(work: &mut String) -> Result<Option<NaiveTime>, TemporalError> {
    let p = &*TIME_PATTERNS;
    let rules: [(&Regex, TimeReader); 5] = [
        (&p.meridiem, read_meridiem),
        (&p.clock, read_clock),
        (&p.oclock, read_oclock),
        (&p.noon, read_noon),
        (&p.midnight, read_midnight),
    ];
    for (re, read) in rules {
        if let Some(time) = take(work, re, read)? {
            return Ok(Some(time));
        }
    }
    Ok(None)
}

fn take_date(work: &mut String, now: NaiveDateTime) -> Result<Option<Anchor>, TemporalError> {
    let p = &*DATE_PATTERNS;
    let rules: [(&Regex, DateReader); 11] = [
        (&p.relative_in, read_relative),
        (&p.from_now, read_relative),
        (&p.day_after_tomorrow, read_day_after_tomorrow),
        (&p.tonight, read_tonight),
        (&p.keyword, read_keyword),
        (&p.next_period, read_next_period),
        (&p.iso, read_iso),
        (&p.numeric, read_numeric),
        (&p.day_month, read_day_month),
        (&p.month_day, read_month_day),
        (&p.weekday, read_weekday),
    ];
    for (re, read) in rules {
        if let Some(anchor) = take(work, re, |caps| read(caps, now))? {
            return Ok(Some(anchor));
        }
    }
    Ok(None)
}

fn only_fillers(work: &str) -> bool {
    work.split(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?' | ';' | '\''))
        .filter(|token| !token.is_empty())
        .all(|token| FILLER_WORDS.contains(&token))
}

// =============================================================================
// Time readers
// =============================================================================

fn hm(hour: u32, minute: u32) -> Result<NaiveTime, TemporalError> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| TemporalError::InvalidTime(format!("{hour}:{minute:02}")))
}

fn number(text: &str) -> Result<u32, TemporalError> {
    text.parse()
        .map_err(|_| TemporalError::Unrecognized(text.to_string()))
}

fn read_meridiem(caps: &Captures<'_>) -> Result<NaiveTime, TemporalError> {
    let hour = number(&caps[1])?;
    let minute = caps.get(2).map_or(Ok(0), |m| number(m.as_str()))?;
    if !(1..=12).contains(&hour) {
        return Err(TemporalError::InvalidTime(caps[0].trim().to_string()));
    }
    let pm = &caps[3] == "p";
    hm(hour % 12 + if pm { 12 } else { 0 }, minute)
}

fn read_clock(caps: &Captures<'_>) -> Result<NaiveTime, TemporalError> {
    hm(number(&caps[1])?, number(&caps[2])?)
}

fn read_oclock(caps: &Captures<'_>) -> Result<NaiveTime, TemporalError> {
    hm(number(&caps[1])?, 0)
}

fn read_noon(_: &Captures<'_>) -> Result<NaiveTime, TemporalError> {
    hm(12, 0)
}

fn read_midnight(_: &Captures<'_>) -> Result<NaiveTime, TemporalError> {
    hm(0, 0)
}

// =============================================================================
// Date readers
// =============================================================================

fn count(text: &str) -> Result<u32, TemporalError> {
    let value = match text {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        digits => number(digits)?,
    };
    if value > MAX_RELATIVE_AMOUNT {
        return Err(TemporalError::OutOfRange);
    }
    Ok(value)
}

fn read_relative(caps: &Captures<'_>, now: NaiveDateTime) -> Result<Anchor, TemporalError> {
    let amount = count(&caps[1])?;
    let shifted = match &caps[2] {
        "minute" | "min" => now.checked_add_signed(Duration::minutes(i64::from(amount))),
        "hour" | "hr" => now.checked_add_signed(Duration::hours(i64::from(amount))),
        "day" => now.checked_add_signed(Duration::days(i64::from(amount))),
        "week" => now.checked_add_signed(Duration::weeks(i64::from(amount))),
        "month" => now.checked_add_months(Months::new(amount)),
        other => return Err(TemporalError::Unrecognized(other.to_string())),
    };
    shifted.map(Anchor::Instant).ok_or(TemporalError::OutOfRange)
}

fn offset_day(today: NaiveDate, days: i64) -> Result<Anchor, TemporalError> {
    today
        .checked_add_signed(Duration::days(days))
        .map(Anchor::Day)
        .ok_or(TemporalError::OutOfRange)
}

fn read_day_after_tomorrow(_: &Captures<'_>, now: NaiveDateTime) -> Result<Anchor, TemporalError> {
    offset_day(now.date(), 2)
}

fn read_tonight(_: &Captures<'_>, now: NaiveDateTime) -> Result<Anchor, TemporalError> {
    Ok(Anchor::Instant(now.date().and_time(hm(TONIGHT_HOUR, 0)?)))
}

fn read_keyword(caps: &Captures<'_>, now: NaiveDateTime) -> Result<Anchor, TemporalError> {
    match &caps[1] {
        "now" => Ok(Anchor::Instant(now)),
        "today" => offset_day(now.date(), 0),
        "tomorrow" => offset_day(now.date(), 1),
        "yesterday" => offset_day(now.date(), -1),
        other => Err(TemporalError::Unrecognized(other.to_string())),
    }
}

fn read_next_period(caps: &Captures<'_>, now: NaiveDateTime) -> Result<Anchor, TemporalError> {
    let today = now.date();
    let shifted = match &caps[1] {
        "week" => today.checked_add_signed(Duration::weeks(1)),
        "month" => today.checked_add_months(Months::new(1)),
        "year" => today.checked_add_months(Months::new(12)),
        other => return Err(TemporalError::Unrecognized(other.to_string())),
    };
    shifted.map(Anchor::Day).ok_or(TemporalError::OutOfRange)
}

fn read_iso(caps: &Captures<'_>, _: NaiveDateTime) -> Result<Anchor, TemporalError> {
    let year: i32 = caps[1]
        .parse()
        .map_err(|_| TemporalError::InvalidDate(caps[0].to_string()))?;
    ymd(year, number(&caps[2])?, number(&caps[3])?, &caps[0]).map(Anchor::Day)
}

fn read_numeric(caps: &Captures<'_>, now: NaiveDateTime) -> Result<Anchor, TemporalError> {
    let month = number(&caps[1])?;
    let day = number(&caps[2])?;
    dated(now.date(), month, day, caps.get(3).map(|m| m.as_str()), &caps[0])
}

fn read_day_month(caps: &Captures<'_>, now: NaiveDateTime) -> Result<Anchor, TemporalError> {
    let day = number(&caps[1])?;
    let month = month_number(&caps[2])?;
    dated(now.date(), month, day, caps.get(3).map(|m| m.as_str()), &caps[0])
}

fn read_month_day(caps: &Captures<'_>, now: NaiveDateTime) -> Result<Anchor, TemporalError> {
    let month = month_number(&caps[1])?;
    let day = number(&caps[2])?;
    dated(now.date(), month, day, caps.get(3).map(|m| m.as_str()), &caps[0])
}

fn read_weekday(caps: &Captures<'_>, now: NaiveDateTime) -> Result<Anchor, TemporalError> {
    let target = weekday(&caps[2])?;
    let modifier = caps.get(1).map(|m| m.as_str());
    Ok(Anchor::Day(resolve_weekday(now.date(), target, modifier)))
}

/// Calendar date with an explicit year, or the next occurrence of
/// `month`/`day` on or after `today` when the year is omitted.
fn dated(
    today: NaiveDate,
    month: u32,
    day: u32,
    year: Option<&str>,
    source: &str,
) -> Result<Anchor, TemporalError> {
    let date = match year {
        Some(year) => {
            let year: i32 = year
                .parse()
                .map_err(|_| TemporalError::InvalidDate(source.to_string()))?;
            let year = if year < 100 { 2000 + year } else { year };
            ymd(year, month, day, source)?
        }
        None => match NaiveDate::from_ymd_opt(today.year(), month, day) {
            Some(date) if date >= today => date,
            _ => ymd(today.year() + 1, month, day, source)?,
        },
    };
    Ok(Anchor::Day(date))
}

fn ymd(year: i32, month: u32, day: u32, source: &str) -> Result<NaiveDate, TemporalError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| TemporalError::InvalidDate(source.trim().to_string()))
}

fn month_number(name: &str) -> Result<u32, TemporalError> {
    let month = match name.get(..3).unwrap_or(name) {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return Err(TemporalError::Unrecognized(name.to_string())),
    };
    Ok(month)
}

fn weekday(name: &str) -> Result<Weekday, TemporalError> {
    let day = match name.get(..3).unwrap_or(name) {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return Err(TemporalError::Unrecognized(name.to_string())),
    };
    Ok(day)
}

/// Bare, "this", "on" and "coming" pick the next occurrence on or after
/// today; "next" is strictly after today; "last" is strictly before.
fn resolve_weekday(today: NaiveDate, target: Weekday, modifier: Option<&str>) -> NaiveDate {
    let current = i64::from(today.weekday().num_days_from_monday());
    let wanted = i64::from(target.num_days_from_monday());
    let ahead = (wanted - current).rem_euclid(7);
    match modifier {
        Some("next") => today + Duration::days(if ahead == 0 { 7 } else { ahead }),
        Some("last") => {
            let back = (current - wanted).rem_euclid(7);
            today - Duration::days(if back == 0 { 7 } else { back })
        }
        _ => today + Duration::days(ahead),
    }
}
