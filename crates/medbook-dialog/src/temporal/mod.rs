//! Temporal normalization.
//!
//! Turns free-text date and time expressions captured by the classifier into
//! concrete values relative to a caller-supplied `now`. Parsing goes through
//! an injected [`DateParser`] so sessions never depend on global state.

pub mod english;

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Timelike};

use crate::error::TemporalError;

pub use english::EnglishDateParser;

/// Parses natural-language text into an absolute local wall-clock instant.
pub trait DateParser: Send + Sync {
    fn parse(&self, text: &str, now: NaiveDateTime) -> Result<NaiveDateTime, TemporalError>;
}

/// Result of normalizing one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {
    /// Absolute instant.
    Instant(NaiveDateTime),
    /// Offset from the start of the parsed instant's calendar day.
    TimeOfDay(Duration),
}

/// Stateless normalizer shared by every session.
#[derive(Clone)]
pub struct TemporalNormalizer {
    parser: Arc<dyn DateParser>,
}

impl Default for TemporalNormalizer {
    fn default() -> Self {
        Self::english()
    }
}

impl std::fmt::Debug for TemporalNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporalNormalizer").finish_non_exhaustive()
    }
}

impl TemporalNormalizer {
    pub fn new(parser: Arc<dyn DateParser>) -> Self {
        Self { parser }
    }

    /// Normalizer backed by [`EnglishDateParser`].
    pub fn english() -> Self {
        Self::new(Arc::new(EnglishDateParser::new()))
    }

    /// Normalize `raw` either to an instant or, when `time_only` is set, to
    /// an intraday offset.
    pub fn normalize(
        &self,
        raw: &str,
        time_only: bool,
        now: NaiveDateTime,
    ) -> Result<Normalized, TemporalError> {
        let instant = self.parser.parse(raw, now)?;
        if time_only {
            Ok(Normalized::TimeOfDay(offset_from_midnight(instant)))
        } else {
            Ok(Normalized::Instant(instant))
        }
    }

    pub fn instant(&self, raw: &str, now: NaiveDateTime) -> Result<NaiveDateTime, TemporalError> {
        self.parser.parse(raw, now)
    }

    pub fn time_of_day(&self, raw: &str, now: NaiveDateTime) -> Result<Duration, TemporalError> {
        self.parser.parse(raw, now).map(offset_from_midnight)
    }
}

/// Offset of `instant` from the start of its own calendar day.
pub fn offset_from_midnight(instant: NaiveDateTime) -> Duration {
    let time = instant.time();
    Duration::seconds(i64::from(time.num_seconds_from_midnight()))
        + Duration::nanoseconds(i64::from(time.nanosecond()))
}

/// Midnight of `date` plus `offset`. `None` when the result leaves chrono's range.
pub fn combine(date: NaiveDate, offset: Duration) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)?.checked_add_signed(offset)
}

// =============================================================================
// Clock
// =============================================================================

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
