//! Shared domain types: user identifiers, the doctor directory, and the
//! classifier output consumed by the dialog engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MedbookError, Result};

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Opaque identifier of an end user on some transport (chat id, session
/// cookie, console user name).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// Doctor Directory
// =============================================================================

/// A bookable doctor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    /// Directory key emitted by the NLU layer as an entity option.
    pub id: String,
    /// Human-readable name used in prompts and confirmations.
    pub name: String,
}

impl Doctor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Static, ordered mapping from doctor id to display name.
///
/// Built once at startup and shared read-only (behind an `Arc`) by every
/// session. Insertion order is the order doctors are listed to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoctorDirectory {
    doctors: Vec<Doctor>,
}

impl Default for DoctorDirectory {
    fn default() -> Self {
        Self {
            doctors: default_doctors(),
        }
    }
}

impl DoctorDirectory {
    /// Build a directory from a list of doctors.
    ///
    /// Rejects an empty list and duplicate ids.
    pub fn new(doctors: Vec<Doctor>) -> Result<Self> {
        if doctors.is_empty() {
            return Err(MedbookError::EmptyDirectory);
        }
        for (i, doctor) in doctors.iter().enumerate() {
            if doctors[..i].iter().any(|d| d.id == doctor.id) {
                return Err(MedbookError::Config(format!(
                    "duplicate doctor id: {}",
                    doctor.id
                )));
            }
        }
        Ok(Self { doctors })
    }

    /// Display name for a directory key.
    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.doctors
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.as_str())
    }

    /// Look up a doctor, failing with `UnknownDoctor` for keys not in the directory.
    pub fn get(&self, id: &str) -> Result<&Doctor> {
        self.doctors
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| MedbookError::UnknownDoctor(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.doctors.iter().any(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Doctor> {
        self.doctors.iter()
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }
}

/// The three doctors every deployment ships with.
pub fn default_doctors() -> Vec<Doctor> {
    vec![
        Doctor::new("josh", "Josh Stammer, M.D."),
        Doctor::new("christine", "Christine Collins, M.D."),
        Doctor::new("abraham", "Abraham Brown, M.D."),
    ]
}

// =============================================================================
// Classifier Output
// =============================================================================

/// Semantic kind of an extracted entity.
///
/// Unrecognized kinds are preserved as `Other` so newer classifiers do not
/// break older dialog engines.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Doctor,
    Date,
    Time,
    Datetime,
    Other(String),
}

impl From<String> for EntityKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "doctor" => EntityKind::Doctor,
            "date" => EntityKind::Date,
            "time" => EntityKind::Time,
            "datetime" => EntityKind::Datetime,
            _ => EntityKind::Other(s),
        }
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Doctor => write!(f, "doctor"),
            EntityKind::Date => write!(f, "date"),
            EntityKind::Time => write!(f, "time"),
            EntityKind::Datetime => write!(f, "datetime"),
            EntityKind::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A span of the utterance tagged with a kind and, optionally, a resolved value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(rename = "entity")]
    pub kind: EntityKind,
    /// Raw text as it appeared in the utterance.
    pub source_text: String,
    /// Resolved value; for doctors this is the directory key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
}

impl Entity {
    pub fn doctor(source_text: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Doctor,
            source_text: source_text.into(),
            option: Some(id.into()),
        }
    }

    pub fn date(source_text: impl Into<String>) -> Self {
        Self::text(EntityKind::Date, source_text)
    }

    pub fn time(source_text: impl Into<String>) -> Self {
        Self::text(EntityKind::Time, source_text)
    }

    pub fn datetime(source_text: impl Into<String>) -> Self {
        Self::text(EntityKind::Datetime, source_text)
    }

    fn text(kind: EntityKind, source_text: impl Into<String>) -> Self {
        Self {
            kind,
            source_text: source_text.into(),
            option: None,
        }
    }
}

/// Output of the NLU classifier for one utterance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Intent label, absent when the classifier could not decide.
    #[serde(default)]
    pub intent: Option<String>,
    /// Extracted entities in utterance order.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Canned answer for intents the dialog engine does not handle itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl Classification {
    pub fn new(intent: Option<&str>, entities: Vec<Entity>) -> Self {
        Self {
            intent: intent.map(str::to_string),
            entities,
            answer: None,
        }
    }
}
