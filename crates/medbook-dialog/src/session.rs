//! Per-user dialog session and the turn processor.

use std::sync::Arc;

use chrono::NaiveDateTime;
use medbook_core::{Classification, DoctorDirectory, Entity, EntityKind, MedbookConfig, UserId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DialogError;
use crate::messages;
use crate::temporal::TemporalNormalizer;
use crate::types::{
    BookingRequest, Continuation, DialogEffect, Intent, IntentLabels, MissingSlot, Slots,
    TurnOutput,
};

/// Shared, read-only collaborators every session is constructed with.
#[derive(Clone, Debug)]
pub struct DialogContext {
    pub directory: Arc<DoctorDirectory>,
    pub normalizer: TemporalNormalizer,
    pub labels: IntentLabels,
}

impl Default for DialogContext {
    fn default() -> Self {
        Self {
            directory: Arc::new(DoctorDirectory::default()),
            normalizer: TemporalNormalizer::english(),
            labels: IntentLabels::default(),
        }
    }
}

impl DialogContext {
    pub fn new(
        directory: Arc<DoctorDirectory>,
        normalizer: TemporalNormalizer,
        labels: IntentLabels,
    ) -> Self {
        Self {
            directory,
            normalizer,
            labels,
        }
    }

    /// Build the directory and intent labels from configuration, using the
    /// English date parser.
    pub fn from_config(config: &MedbookConfig) -> Result<Self, DialogError> {
        Ok(Self {
            directory: Arc::new(config.directory()?),
            normalizer: TemporalNormalizer::english(),
            labels: IntentLabels::from(&config.dialog),
        })
    }
}

/// Conversation state for one user.
#[derive(Debug)]
pub struct DialogSession {
    user_id: UserId,
    continuation: Continuation,
    slots: Slots,
    context: DialogContext,
    turns: u64,
}

impl DialogSession {
    pub fn new(user_id: UserId, context: DialogContext) -> Self {
        Self {
            user_id,
            continuation: Continuation::Idle,
            slots: Slots::default(),
            context,
            turns: 0,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn continuation(&self) -> &Continuation {
        &self.continuation
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Process one classified utterance against `now`.
    ///
    /// A pending continuation overrides the classifier's label for this turn
    /// only; the entities are merged either way.
    pub fn process_turn(&mut self, classification: &Classification, now: NaiveDateTime) -> TurnOutput {
        self.turns += 1;

        let intent = match self.continuation.take() {
            Some(forced) => {
                debug!(
                    user_id = %self.user_id,
                    intent = %forced,
                    classifier_label = ?classification.intent,
                    "Continuing forced intent"
                );
                forced
            }
            None => self.context.labels.resolve(classification.intent.as_deref()),
        };

        let (answer, effect) = match &intent {
            Intent::Booking => self.handle_booking(&classification.entities, now),
            Intent::RedirectToHuman => {
                info!(user_id = %self.user_id, "Handing conversation to a human manager");
                (
                    Some(messages::HANDOFF.to_string()),
                    Some(DialogEffect::HandOff(self.user_id.clone())),
                )
            }
            Intent::Unclassified => (Some(messages::CLARIFY.to_string()), None),
            Intent::Other(_) => (classification.answer.clone(), None),
        };

        info!(
            user_id = %self.user_id,
            intent = %intent,
            answered = answer.is_some(),
            "Turn processed"
        );

        TurnOutput {
            intent,
            answer,
            effect,
        }
    }

    fn handle_booking(
        &mut self,
        entities: &[Entity],
        now: NaiveDateTime,
    ) -> (Option<String>, Option<DialogEffect>) {
        self.merge_entities(entities, now);

        if let Some(missing) = self.slots.missing() {
            self.continuation = Continuation::Awaiting(Intent::Booking);
            let prompt = match missing {
                MissingSlot::Doctor => messages::doctor_prompt(&self.context.directory),
                MissingSlot::Date => messages::DATE_PROMPT.to_string(),
                MissingSlot::Time => messages::TIME_PROMPT.to_string(),
            };
            return (Some(prompt), None);
        }

        let (Some(doctor_id), Some(at)) = (self.slots.doctor.clone(), self.slots.appointment())
        else {
            return self.reject_appointment(None);
        };
        if at <= now {
            return self.reject_appointment(Some(at));
        }

        let doctor_name = self
            .context
            .directory
            .display_name(&doctor_id)
            .unwrap_or(&doctor_id)
            .to_string();
        let request = BookingRequest {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            doctor_id,
            doctor_name,
            at,
        };
        info!(
            user_id = %self.user_id,
            booking_id = %request.id,
            doctor = %request.doctor_id,
            at = %request.at,
            "Booking completed"
        );

        let answer = messages::confirmation(&request.doctor_name, at);
        self.slots.clear();
        (Some(answer), Some(DialogEffect::SubmitBooking(request)))
    }

    fn reject_appointment(
        &mut self,
        at: Option<NaiveDateTime>,
    ) -> (Option<String>, Option<DialogEffect>) {
        warn!(user_id = %self.user_id, at = ?at, "Rejecting unavailable appointment time");
        self.slots.clear_temporal();
        self.continuation = Continuation::Awaiting(Intent::Booking);
        (Some(messages::UNAVAILABLE.to_string()), None)
    }

    fn merge_entities(&mut self, entities: &[Entity], now: NaiveDateTime) {
        let normalizer = &self.context.normalizer;
        for entity in entities {
            match &entity.kind {
                EntityKind::Doctor => match entity.option.as_deref() {
                    Some(id) if self.context.directory.contains(id) => {
                        self.slots.doctor = Some(id.to_string());
                    }
                    other => {
                        warn!(
                            user_id = %self.user_id,
                            doctor = ?other,
                            source_text = %entity.source_text,
                            "Ignoring doctor not present in the directory"
                        );
                    }
                },
                EntityKind::Date => match normalizer.instant(&entity.source_text, now) {
                    Ok(instant) => self.slots.date = Some(instant.date()),
                    Err(e) => debug!(source_text = %entity.source_text, "Date not extracted: {}", e),
                },
                EntityKind::Time => match normalizer.time_of_day(&entity.source_text, now) {
                    Ok(offset) => self.slots.time = Some(offset),
                    Err(e) => debug!(source_text = %entity.source_text, "Time not extracted: {}", e),
                },
                EntityKind::Datetime => match normalizer.instant(&entity.source_text, now) {
                    Ok(instant) => self.slots.datetime = Some(instant),
                    Err(e) => {
                        debug!(source_text = %entity.source_text, "Datetime not extracted: {}", e)
                    }
                },
                EntityKind::Other(kind) => {
                    debug!(kind = %kind, "Ignoring entity of unknown kind");
                }
            }
        }
    }
}
