//! Rule-based intent and entity classifier.
//!
//! Recognizes booking and handoff requests, greetings, doctor mentions from
//! the directory, and date/time spans. Date and time spans found in the same
//! utterance are merged into one `datetime` entity.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use medbook_core::{Classification, DoctorDirectory, Entity};
use medbook_dialog::temporal::english::{MONTHS, WEEKDAYS};
use medbook_dialog::{Classifier, DialogError, IntentLabels};
use regex::Regex;
use tracing::debug;

use crate::error::NluError;

pub const GREETING_HELLO: &str = "greetings.hello";
pub const GREETING_BYE: &str = "greetings.bye";

const HELLO_ANSWER: &str = "Hello! I can book you an appointment with one of our doctors.";
const BYE_ANSWER: &str = "Goodbye! Have a nice day.";

// =============================================================================
// Compiled regex sets (compiled once, reused across calls)
// =============================================================================

struct IntentPatterns {
    redirect: Vec<Regex>,
    booking: Vec<Regex>,
    hello: Vec<Regex>,
    bye: Vec<Regex>,
}

static INTENT_PATTERNS: LazyLock<IntentPatterns> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect()
    };

    IntentPatterns {
        // Checked first so "book me a human" reaches a person.
        redirect: mk(&[
            r"(?i)\bhuman\b",
            r"(?i)\bmanager\b",
            r"(?i)\boperator\b",
            r"(?i)\breal\s+person\b",
            r"(?i)\b(?:talk|speak)\s+(?:to|with)\s+(?:someone|somebody|a\s+person)\b",
            r"(?i)\blive\s+agent\b",
        ]),
        booking: mk(&[
            r"(?i)\bbook(?:ing)?\b",
            r"(?i)\bappointment\b",
            r"(?i)\breserv(?:e|ation)\b",
            r"(?i)\bschedule\b",
            r"(?i)\bsee\s+(?:a\s+|the\s+)?doctor\b",
            r"(?i)\bvisit\b",
        ]),
        hello: mk(&[
            r"(?i)^\s*(?:hi|hello|hey|greetings)\b",
            r"(?i)^\s*good\s+(?:morning|afternoon|evening)\b",
        ]),
        bye: mk(&[
            r"(?i)\b(?:bye|goodbye|farewell)\b",
            r"(?i)\bsee\s+you(?:\s+later)?\b",
        ]),
    }
});

const COUNT: &str = r"\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";
const UNITS: &str = r"(?:minute|min|hour|hr|day|week|month)s?";

static DATE_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = [
        r"(?:the\s+)?day\s+after\s+tomorrow".to_string(),
        r"today|tonight|tomorrow|yesterday".to_string(),
        r"next\s+(?:week|month|year)".to_string(),
        format!(r"in\s+(?:{COUNT})\s+{UNITS}"),
        format!(r"(?:{COUNT})\s+{UNITS}\s+from\s+now"),
        r"\d{4}-\d{1,2}-\d{1,2}".to_string(),
        r"\d{1,2}/\d{1,2}(?:/\d{4}|/\d{2})?".to_string(),
        format!(r"(?:the\s+)?\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:{MONTHS})(?:,?\s+\d{{4}})?"),
        format!(r"(?:{MONTHS})\.?\s+(?:the\s+)?\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?"),
        format!(r"(?:(?:this|next|last|on|coming)\s+)?(?:{WEEKDAYS})"),
    ];
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).unwrap()
});

static TIME_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{1,2}(?::\d{2})?\s*[ap]\.?m\b\.?|\d{1,2}:\d{2}\b|\d{1,2}\s*o'?clock\b|noon\b|midday\b|midnight\b)",
    )
    .unwrap()
});

// =============================================================================
// Classifier
// =============================================================================

/// Pattern-based [`Classifier`] over a fixed doctor directory.
pub struct PatternClassifier {
    labels: IntentLabels,
    doctors: Vec<(String, Regex)>,
}

impl PatternClassifier {
    /// Build doctor matchers for every directory entry. A doctor is matched
    /// by id, full name, or any name part of three letters or more,
    /// optionally prefixed with "Dr." or "doctor".
    pub fn new(directory: Arc<DoctorDirectory>, labels: IntentLabels) -> Result<Self, NluError> {
        let mut doctors = Vec::with_capacity(directory.len());
        for doctor in directory.iter() {
            let mut variants = name_variants(&doctor.id, &doctor.name);
            variants.sort_by_key(|v| std::cmp::Reverse(v.len()));
            let alternation: Vec<String> = variants.iter().map(|v| regex::escape(v)).collect();
            let pattern = format!(
                r"(?i)\b(?:dr\.?\s+|doctor\s+)?(?:{})\b",
                alternation.join("|")
            );
            doctors.push((doctor.id.clone(), Regex::new(&pattern)?));
        }
        Ok(Self { labels, doctors })
    }

    /// Classify synchronously. The async trait method delegates here.
    pub fn classify_text(&self, text: &str) -> Classification {
        let (intent, answer) = self.detect_intent(text);
        let mut classification = Classification::new(intent, self.extract_entities(text));
        classification.answer = answer.map(str::to_string);
        debug!(
            intent = ?classification.intent,
            entities = classification.entities.len(),
            "Utterance classified"
        );
        classification
    }

    fn detect_intent(&self, text: &str) -> (Option<&str>, Option<&'static str>) {
        let p = &*INTENT_PATTERNS;
        let any = |set: &[Regex]| set.iter().any(|re| re.is_match(text));

        if any(&p.redirect) {
            (Some(self.labels.redirect.as_str()), None)
        } else if any(&p.booking) {
            (Some(self.labels.booking.as_str()), None)
        } else if any(&p.hello) {
            (Some(GREETING_HELLO), Some(HELLO_ANSWER))
        } else if any(&p.bye) {
            (Some(GREETING_BYE), Some(BYE_ANSWER))
        } else {
            (None, None)
        }
    }

    fn extract_entities(&self, text: &str) -> Vec<Entity> {
        let mut found: Vec<(usize, Entity)> = Vec::new();

        // Last mention of each doctor, so a correction later in the
        // utterance wins.
        for (id, re) in &self.doctors {
            if let Some(m) = re.find_iter(text).last() {
                found.push((m.start(), Entity::doctor(m.as_str(), id.as_str())));
            }
        }

        let date = DATE_SPAN_RE.find(text);
        let time = TIME_SPAN_RE.find(text);
        match (date, time) {
            (Some(d), Some(t)) => {
                let source = format!("{} {}", d.as_str(), t.as_str());
                found.push((d.start().min(t.start()), Entity::datetime(source)));
            }
            (Some(d), None) => found.push((d.start(), Entity::date(d.as_str()))),
            (None, Some(t)) => found.push((t.start(), Entity::time(t.as_str()))),
            (None, None) => {}
        }

        found.sort_by_key(|(start, _)| *start);
        found.into_iter().map(|(_, entity)| entity).collect()
    }
}

fn name_variants(id: &str, display_name: &str) -> Vec<String> {
    let bare = display_name
        .split(',')
        .next()
        .unwrap_or(display_name)
        .trim();
    let mut variants = vec![id.to_lowercase(), bare.to_lowercase()];
    for part in bare.split_whitespace() {
        if part.chars().count() >= 3 {
            variants.push(part.to_lowercase());
        }
    }
    variants.retain(|v| !v.is_empty());
    variants.sort();
    variants.dedup();
    variants
}

#[async_trait]
impl Classifier for PatternClassifier {
    async fn classify(&self, text: &str, _language: &str) -> Result<Classification, DialogError> {
        Ok(self.classify_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medbook_core::{Doctor, EntityKind};

    fn classifier() -> PatternClassifier {
        PatternClassifier::new(Arc::new(DoctorDirectory::default()), IntentLabels::default())
            .unwrap()
    }

    // ---- intents ----

    #[test]
    fn test_booking_intent() {
        let c = classifier();
        assert_eq!(c.classify_text("I want to book").intent.as_deref(), Some("user.book"));
        assert_eq!(
            c.classify_text("Can I make an appointment?").intent.as_deref(),
            Some("user.book")
        );
    }

    #[test]
    fn test_redirect_wins_over_booking() {
        let c = classifier();
        let result = c.classify_text("I'd rather book through a human");
        assert_eq!(result.intent.as_deref(), Some("user.redirect"));
    }

    #[test]
    fn test_greetings_carry_answers() {
        let c = classifier();
        let hello = c.classify_text("Hello there");
        assert_eq!(hello.intent.as_deref(), Some(GREETING_HELLO));
        assert_eq!(hello.answer.as_deref(), Some(HELLO_ANSWER));

        let bye = c.classify_text("ok, bye");
        assert_eq!(bye.intent.as_deref(), Some(GREETING_BYE));
        assert_eq!(bye.answer.as_deref(), Some(BYE_ANSWER));
    }

    #[test]
    fn test_unmatched_text_has_no_intent() {
        let c = classifier();
        let result = c.classify_text("purple monkey dishwasher");
        assert!(result.intent.is_none());
        assert!(result.entities.is_empty());
    }

    #[test]
    fn test_configured_labels_are_emitted() {
        let labels = IntentLabels {
            booking: "appointment.book".to_string(),
            redirect: "agent.human".to_string(),
        };
        let c = PatternClassifier::new(Arc::new(DoctorDirectory::default()), labels).unwrap();
        assert_eq!(c.classify_text("book please").intent.as_deref(), Some("appointment.book"));
        assert_eq!(c.classify_text("a manager").intent.as_deref(), Some("agent.human"));
    }

    // ---- doctor entities ----

    #[test]
    fn test_doctor_by_first_last_and_full_name() {
        let c = classifier();
        for text in ["Josh", "Dr. Stammer", "josh stammer please"] {
            let result = c.classify_text(text);
            assert_eq!(result.entities.len(), 1, "text: {}", text);
            assert_eq!(result.entities[0].kind, EntityKind::Doctor);
            assert_eq!(result.entities[0].option.as_deref(), Some("josh"));
        }
    }

    #[test]
    fn test_doctor_source_text_keeps_case() {
        let c = classifier();
        let result = c.classify_text("with Christine Collins");
        assert_eq!(result.entities[0], Entity::doctor("Christine Collins", "christine"));
    }

    #[test]
    fn test_later_mention_of_a_doctor_wins() {
        let c = classifier();
        let result = c.classify_text("Christine, no, Josh... actually Christine");
        let options: Vec<&str> = result
            .entities
            .iter()
            .filter_map(|e| e.option.as_deref())
            .collect();
        assert_eq!(options, vec!["josh", "christine"]);
    }

    #[test]
    fn test_custom_directory() {
        let directory =
            DoctorDirectory::new(vec![Doctor::new("house", "Gregory House, M.D.")]).unwrap();
        let c = PatternClassifier::new(Arc::new(directory), IntentLabels::default()).unwrap();
        let result = c.classify_text("book Dr House");
        assert_eq!(result.entities[0].option.as_deref(), Some("house"));
        assert!(c.classify_text("book Josh").entities.is_empty());
    }

    // ---- temporal entities ----

    #[test]
    fn test_date_only() {
        let c = classifier();
        let result = c.classify_text("next Monday");
        assert_eq!(result.entities, vec![Entity::date("next Monday")]);
    }

    #[test]
    fn test_time_only() {
        let c = classifier();
        assert_eq!(c.classify_text("10am").entities, vec![Entity::time("10am")]);
        assert_eq!(c.classify_text("at 15:30").entities, vec![Entity::time("15:30")]);
    }

    #[test]
    fn test_date_and_time_merge_into_datetime() {
        let c = classifier();
        let result =
            c.classify_text("I'd like to book Josh next Monday at 10am");
        assert_eq!(result.intent.as_deref(), Some("user.book"));
        assert_eq!(
            result.entities,
            vec![
                Entity::doctor("Josh", "josh"),
                Entity::datetime("next Monday 10am"),
            ]
        );
    }

    #[test]
    fn test_abbreviated_weekday_spans() {
        let c = classifier();
        assert_eq!(
            c.classify_text("book Josh on Mon at 3pm").entities,
            vec![Entity::doctor("Josh", "josh"), Entity::datetime("on Mon 3pm")]
        );
        assert_eq!(c.classify_text("tues").entities, vec![Entity::date("tues")]);
        assert_eq!(c.classify_text("next thu").entities, vec![Entity::date("next thu")]);
        assert!(c.classify_text("monkey business").entities.is_empty());
    }

    #[test]
    fn test_month_name_date_span() {
        let c = classifier();
        let result = c.classify_text("on the 20th of October");
        assert_eq!(result.entities, vec![Entity::date("the 20th of October")]);
    }

    #[test]
    fn test_extracted_spans_parse() {
        use chrono::NaiveDate;
        use medbook_dialog::{DateParser, EnglishDateParser};

        let now = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let parser = EnglishDateParser::new();
        let c = classifier();
        for text in [
            "book Josh tomorrow at 3:30 pm",
            "Christine on October 20 at noon",
            "Abraham in 2 days at 9am",
            "Josh 10/20 15:00",
            "book Josh on Mon at 3pm",
            "book Josh tues at 3pm",
            "book Josh next thu at 3pm",
            "Christine this Sat at 10am",
        ] {
            let result = c.classify_text(text);
            let temporal = result
                .entities
                .iter()
                .find(|e| e.kind == EntityKind::Datetime)
                .unwrap_or_else(|| panic!("no datetime in {}", text));
            assert!(
                parser.parse(&temporal.source_text, now).is_ok(),
                "unparsed span {:?}",
                temporal.source_text
            );
        }
    }

    #[tokio::test]
    async fn test_async_classify() {
        let c = classifier();
        let result = c.classify("book Josh", "en").await.unwrap();
        assert_eq!(result.intent.as_deref(), Some("user.book"));
        assert_eq!(result.entities.len(), 1);
    }
}
