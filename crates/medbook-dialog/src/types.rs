//! Dialog state and turn output types.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use medbook_core::config::DialogConfig;
use medbook_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::temporal;

// =============================================================================
// Intents
// =============================================================================

/// Effective intent of a turn after continuation and label mapping.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    Booking,
    RedirectToHuman,
    Unclassified,
    /// Any label the dialog does not own.
    Other(String),
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Booking => write!(f, "booking"),
            Intent::RedirectToHuman => write!(f, "redirect_to_human"),
            Intent::Unclassified => write!(f, "unclassified"),
            Intent::Other(label) => write!(f, "{}", label),
        }
    }
}

impl Serialize for Intent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Classifier labels that map to the dialog's own intents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentLabels {
    pub booking: String,
    pub redirect: String,
}

impl Default for IntentLabels {
    fn default() -> Self {
        Self {
            booking: "user.book".to_string(),
            redirect: "user.redirect".to_string(),
        }
    }
}

impl From<&DialogConfig> for IntentLabels {
    fn from(config: &DialogConfig) -> Self {
        Self {
            booking: config.booking_intent.clone(),
            redirect: config.redirect_intent.clone(),
        }
    }
}

impl IntentLabels {
    /// Map a classifier label. Absent, empty and `"None"` are unclassified.
    pub fn resolve(&self, label: Option<&str>) -> Intent {
        match label.map(str::trim) {
            None | Some("") | Some("None") => Intent::Unclassified,
            Some(l) if l == self.booking => Intent::Booking,
            Some(l) if l == self.redirect => Intent::RedirectToHuman,
            Some(l) => Intent::Other(l.to_string()),
        }
    }
}

/// Forced next intent, consumed at the start of the following turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Continuation {
    #[default]
    Idle,
    Awaiting(Intent),
}

impl Continuation {
    /// Take the forced intent, leaving `Idle` behind.
    pub fn take(&mut self) -> Option<Intent> {
        match std::mem::take(self) {
            Continuation::Idle => None,
            Continuation::Awaiting(intent) => Some(intent),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Continuation::Idle)
    }
}

// =============================================================================
// Slots
// =============================================================================

/// Booking information gathered so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Slots {
    /// Directory key.
    pub doctor: Option<String>,
    /// Calendar day.
    pub date: Option<NaiveDate>,
    /// Offset from midnight.
    pub time: Option<Duration>,
    /// Absolute instant; wins over `date` + `time`.
    pub datetime: Option<NaiveDateTime>,
}

/// The next piece of information to ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingSlot {
    Doctor,
    Date,
    Time,
}

impl Slots {
    pub fn is_empty(&self) -> bool {
        self.doctor.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.datetime.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Reset date, time and datetime, keeping the doctor.
    pub fn clear_temporal(&mut self) {
        self.date = None;
        self.time = None;
        self.datetime = None;
    }

    pub fn is_ready(&self) -> bool {
        self.missing().is_none()
    }

    /// Highest-priority missing slot, `None` once a booking can be made.
    pub fn missing(&self) -> Option<MissingSlot> {
        if self.doctor.is_none() {
            Some(MissingSlot::Doctor)
        } else if self.datetime.is_some() {
            None
        } else if self.date.is_none() {
            Some(MissingSlot::Date)
        } else if self.time.is_none() {
            Some(MissingSlot::Time)
        } else {
            None
        }
    }

    /// The instant the booking would be made for.
    pub fn appointment(&self) -> Option<NaiveDateTime> {
        match (self.datetime, self.date, self.time) {
            (Some(datetime), _, _) => Some(datetime),
            (None, Some(date), Some(time)) => temporal::combine(date, time),
            _ => None,
        }
    }
}

// =============================================================================
// Turn Output
// =============================================================================

/// A completed booking handed to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: Uuid,
    pub user_id: UserId,
    pub doctor_id: String,
    pub doctor_name: String,
    pub at: NaiveDateTime,
}

/// Side effect requested by a turn, dispatched fire-and-forget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogEffect {
    SubmitBooking(BookingRequest),
    HandOff(UserId),
}

/// Result of processing one utterance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutput {
    pub intent: Intent,
    pub answer: Option<String>,
    pub effect: Option<DialogEffect>,
}

/// Reply returned to transports after a turn completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnReply {
    pub user_id: UserId,
    pub intent: Intent,
    pub answer: Option<String>,
}

/// Registry bookkeeping for one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub user_id: UserId,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub last_active: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_slots() -> Slots {
        Slots {
            doctor: Some("josh".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 10, 19),
            time: Some(Duration::hours(10)),
            datetime: None,
        }
    }

    // ---- intent labels ----

    #[test]
    fn test_resolve_labels() {
        let labels = IntentLabels::default();
        assert_eq!(labels.resolve(Some("user.book")), Intent::Booking);
        assert_eq!(labels.resolve(Some("user.redirect")), Intent::RedirectToHuman);
        assert_eq!(labels.resolve(Some("None")), Intent::Unclassified);
        assert_eq!(labels.resolve(Some("")), Intent::Unclassified);
        assert_eq!(labels.resolve(None), Intent::Unclassified);
        assert_eq!(
            labels.resolve(Some("greetings.hello")),
            Intent::Other("greetings.hello".to_string())
        );
    }

    #[test]
    fn test_labels_from_config() {
        let config = DialogConfig {
            booking_intent: "appointment.book".to_string(),
            redirect_intent: "agent.human".to_string(),
            max_message_length: 100,
        };
        let labels = IntentLabels::from(&config);
        assert_eq!(labels.resolve(Some("appointment.book")), Intent::Booking);
        assert_eq!(
            labels.resolve(Some("user.book")),
            Intent::Other("user.book".to_string())
        );
    }

    #[test]
    fn test_intent_serializes_as_string() {
        assert_eq!(serde_json::to_value(Intent::Booking).unwrap(), "booking");
        assert_eq!(
            serde_json::to_value(Intent::Other("greetings.bye".to_string())).unwrap(),
            "greetings.bye"
        );
    }

    // ---- continuation ----

    #[test]
    fn test_continuation_take_clears() {
        let mut c = Continuation::Awaiting(Intent::Booking);
        assert_eq!(c.take(), Some(Intent::Booking));
        assert!(c.is_idle());
        assert_eq!(c.take(), None);
    }

    // ---- slots ----

    #[test]
    fn test_missing_priority() {
        let mut slots = Slots::default();
        assert_eq!(slots.missing(), Some(MissingSlot::Doctor));

        // Date and time without a doctor still ask for the doctor first.
        slots.date = NaiveDate::from_ymd_opt(2026, 10, 19);
        slots.time = Some(Duration::hours(10));
        assert_eq!(slots.missing(), Some(MissingSlot::Doctor));

        slots.doctor = Some("josh".to_string());
        slots.date = None;
        assert_eq!(slots.missing(), Some(MissingSlot::Date));

        slots.date = NaiveDate::from_ymd_opt(2026, 10, 19);
        slots.time = None;
        assert_eq!(slots.missing(), Some(MissingSlot::Time));
    }

    #[test]
    fn test_datetime_alone_is_ready() {
        let slots = Slots {
            doctor: Some("josh".to_string()),
            datetime: NaiveDate::from_ymd_opt(2026, 10, 19).and_then(|d| d.and_hms_opt(9, 0, 0)),
            ..Slots::default()
        };
        assert!(slots.is_ready());
    }

    #[test]
    fn test_appointment_prefers_datetime() {
        let mut slots = ready_slots();
        let expected = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(slots.appointment(), Some(expected));

        let datetime = NaiveDate::from_ymd_opt(2026, 11, 2)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        slots.datetime = Some(datetime);
        assert_eq!(slots.appointment(), Some(datetime));
    }

    #[test]
    fn test_clear_temporal_keeps_doctor() {
        let mut slots = ready_slots();
        slots.clear_temporal();
        assert_eq!(slots.doctor.as_deref(), Some("josh"));
        assert!(slots.date.is_none() && slots.time.is_none() && slots.datetime.is_none());

        slots.clear();
        assert!(slots.is_empty());
    }
}
