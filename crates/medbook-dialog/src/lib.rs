//! Slot-filling dialog engine for doctor bookings.
//!
//! A [`DialogService`] receives raw utterances, asks a [`Classifier`] for an
//! intent and entities, and feeds the result to the user's
//! [`DialogSession`]. The session merges entities into its slots, decides
//! whether a booking can be made and produces the next answer. Completed
//! bookings and handoffs go to a [`BookingBackend`] without blocking the
//! reply.

pub mod backend;
pub mod classifier;
pub mod error;
pub mod messages;
pub mod registry;
pub mod service;
pub mod session;
pub mod temporal;
pub mod transport;
pub mod types;

pub use backend::{BookingBackend, LoggingBackend};
pub use classifier::Classifier;
pub use error::{DialogError, TemporalError};
pub use registry::{SessionRegistry, SharedSession};
pub use service::DialogService;
pub use session::{DialogContext, DialogSession};
pub use temporal::{Clock, DateParser, EnglishDateParser, FixedClock, SystemClock, TemporalNormalizer};
pub use transport::{LogTransport, Transport};
pub use types::{
    BookingRequest, Continuation, DialogEffect, Intent, IntentLabels, SessionSummary, Slots,
    TurnOutput, TurnReply,
};
