//! Turn pipeline: classify, process, dispatch effects, deliver.

use std::sync::{Arc, Mutex};

use medbook_core::{Classification, EntityKind, MedbookConfig, UserId};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::backend::BookingBackend;
use crate::classifier::Classifier;
use crate::error::DialogError;
use crate::registry::SessionRegistry;
use crate::session::DialogContext;
use crate::temporal::{Clock, SystemClock};
use crate::transport::Transport;
use crate::types::{DialogEffect, TurnReply};

/// Entry point for transports. One instance serves every user.
pub struct DialogService {
    registry: Arc<SessionRegistry>,
    classifier: Arc<dyn Classifier>,
    transport: Arc<dyn Transport>,
    backend: Arc<dyn BookingBackend>,
    clock: Arc<dyn Clock>,
    language: String,
    max_message_length: usize,
    /// Backend calls still running; finished ones are pruned on dispatch.
    effects: Mutex<Vec<JoinHandle<()>>>,
}

impl DialogService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        classifier: Arc<dyn Classifier>,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn BookingBackend>,
    ) -> Self {
        Self {
            registry,
            classifier,
            transport,
            backend,
            clock: Arc::new(SystemClock),
            language: "en".to_string(),
            max_message_length: 2000,
            effects: Mutex::new(Vec::new()),
        }
    }

    /// Wire a service from configuration: doctor directory, intent labels,
    /// session retention, language and message limit.
    pub fn from_config(
        config: &MedbookConfig,
        classifier: Arc<dyn Classifier>,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn BookingBackend>,
    ) -> Result<Self, DialogError> {
        let context = DialogContext::from_config(config)?;
        let registry = Arc::new(SessionRegistry::from_config(context, &config.sessions));
        Ok(Self::new(registry, classifier, transport, backend)
            .with_language(config.general.language.clone())
            .with_max_message_length(config.dialog.max_message_length))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_max_message_length(mut self, max: usize) -> Self {
        self.max_message_length = max;
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Run one utterance through the pipeline.
    ///
    /// The user's session stays locked from classification until the answer
    /// is delivered, so turns for one user never interleave.
    pub async fn handle_message(
        &self,
        user_id: &UserId,
        text: &str,
    ) -> Result<TurnReply, DialogError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DialogError::EmptyMessage);
        }
        if text.chars().count() > self.max_message_length {
            return Err(DialogError::MessageTooLong(self.max_message_length));
        }

        let session = self.registry.get_or_create(user_id)?;
        let mut session = session.lock().await;

        let classification = self.classifier.classify(text, &self.language).await?;
        validate(&classification)?;

        let output = session.process_turn(&classification, self.clock.now());

        if let Some(effect) = output.effect {
            self.dispatch(effect);
        }
        if let Some(answer) = &output.answer {
            self.transport.deliver(user_id, answer).await?;
        }
        drop(session);

        Ok(TurnReply {
            user_id: user_id.clone(),
            intent: output.intent,
            answer: output.answer,
        })
    }

    /// Spawn the backend call without waiting for it.
    fn dispatch(&self, effect: DialogEffect) {
        let backend = Arc::clone(&self.backend);
        let handle = tokio::spawn(async move {
            let result = match effect {
                DialogEffect::SubmitBooking(request) => {
                    info!(booking_id = %request.id, "Submitting booking");
                    backend.submit(request).await
                }
                DialogEffect::HandOff(user_id) => backend.hand_off(&user_id).await,
            };
            if let Err(e) = result {
                warn!("Booking backend call failed: {}", e);
            }
        });
        if let Ok(mut effects) = self.effects.lock() {
            effects.retain(|h| !h.is_finished());
            effects.push(handle);
        }
    }

    /// Wait for every booking submission and handoff dispatched so far.
    /// Replies never wait on these; call this before shutting down.
    pub async fn flush(&self) {
        let pending = match self.effects.lock() {
            Ok(mut effects) => std::mem::take(&mut *effects),
            Err(_) => return,
        };
        for handle in pending {
            if let Err(e) = handle.await {
                warn!("Booking backend task failed: {}", e);
            }
        }
    }
}

/// Doctor entities must carry the directory key they resolved to.
fn validate(classification: &Classification) -> Result<(), DialogError> {
    for entity in &classification.entities {
        if entity.kind == EntityKind::Doctor && entity.option.is_none() {
            return Err(DialogError::MalformedEntity(format!(
                "doctor entity '{}' has no option",
                entity.source_text
            )));
        }
    }
    Ok(())
}
