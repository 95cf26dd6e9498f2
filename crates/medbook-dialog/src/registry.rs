//! Session registry: maps user identifiers to their dialog sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Local;
use medbook_core::config::SessionConfig;
use medbook_core::UserId;
use tracing::{debug, info, warn};

use crate::error::DialogError;
use crate::session::{DialogContext, DialogSession};
use crate::types::SessionSummary;

/// A session handle. The async mutex serializes turns for one user.
pub type SharedSession = Arc<tokio::sync::Mutex<DialogSession>>;

struct SessionEntry {
    session: SharedSession,
    created_at: i64,
    last_active: i64,
}

impl SessionEntry {
    /// A turn holds the session lock from classification to delivery.
    fn is_busy(&self) -> bool {
        self.session.try_lock().is_err()
    }
}

/// Owns every live session. Sessions are created lazily on first contact,
/// replaced after `ttl_minutes` of inactivity, and the least recently active
/// one is evicted once `max_sessions` is reached. A session in the middle of
/// a turn is never evicted, purged or removed.
pub struct SessionRegistry {
    context: DialogContext,
    ttl_minutes: u32,
    max_sessions: usize,
    sessions: Mutex<HashMap<UserId, SessionEntry>>,
}

impl SessionRegistry {
    /// `ttl_minutes == 0` disables expiry; `max_sessions == 0` disables the cap.
    pub fn new(context: DialogContext, ttl_minutes: u32, max_sessions: usize) -> Self {
        Self {
            context,
            ttl_minutes,
            max_sessions,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(context: DialogContext, config: &SessionConfig) -> Self {
        Self::new(context, config.ttl_minutes, config.max_sessions)
    }

    pub fn context(&self) -> &DialogContext {
        &self.context
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<UserId, SessionEntry>>, DialogError> {
        self.sessions
            .lock()
            .map_err(|e| DialogError::SessionLock(e.to_string()))
    }

    fn is_expired(&self, last_active: i64, now: i64) -> bool {
        if self.ttl_minutes == 0 {
            return false;
        }
        now - last_active > i64::from(self.ttl_minutes) * 60
    }

    /// Return the session for `user_id`, creating a fresh one on first
    /// contact or when the previous one expired.
    pub fn get_or_create(&self, user_id: &UserId) -> Result<SharedSession, DialogError> {
        let now = Local::now().timestamp();
        let mut sessions = self.lock()?;

        if let Some(entry) = sessions.get_mut(user_id) {
            if !self.is_expired(entry.last_active, now) {
                entry.last_active = now;
                return Ok(Arc::clone(&entry.session));
            }
            info!(user_id = %user_id, "Session expired, starting a new one");
            sessions.remove(user_id);
        }

        if self.max_sessions > 0 && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(_, entry)| !entry.is_busy())
                .min_by_key(|(_, entry)| entry.last_active)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => {
                    info!(user_id = %oldest, "Session capacity reached, evicting least recently active");
                    sessions.remove(&oldest);
                }
                None => warn!(
                    live = sessions.len(),
                    "Session capacity reached but every session is mid-turn"
                ),
            }
        }

        let session = Arc::new(tokio::sync::Mutex::new(DialogSession::new(
            user_id.clone(),
            self.context.clone(),
        )));
        sessions.insert(
            user_id.clone(),
            SessionEntry {
                session: Arc::clone(&session),
                created_at: now,
                last_active: now,
            },
        );
        debug!(user_id = %user_id, live = sessions.len(), "Session created");
        Ok(session)
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, DialogError> {
        let now = Local::now().timestamp();
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.is_busy() || !self.is_expired(entry.last_active, now));
        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, "Purged expired sessions");
        }
        Ok(purged)
    }

    /// Forget a user's session. Fails with `SessionBusy` while a turn is
    /// running, since that turn's answer would describe state nobody keeps.
    pub fn remove(&self, user_id: &UserId) -> Result<bool, DialogError> {
        let mut sessions = self.lock()?;
        let busy = match sessions.get(user_id) {
            None => return Ok(false),
            Some(entry) => entry.is_busy(),
        };
        if busy {
            return Err(DialogError::SessionBusy(user_id.to_string()));
        }
        sessions.remove(user_id);
        info!(user_id = %user_id, "Session removed");
        Ok(true)
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.lock()
            .map(|sessions| sessions.contains_key(user_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bookkeeping for every live session, most recently active first.
    pub fn summaries(&self) -> Vec<SessionSummary> {
        let sessions = match self.lock() {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .map(|(user_id, entry)| SessionSummary {
                user_id: user_id.clone(),
                created_at: entry.created_at,
                last_active: entry.last_active,
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.last_active
                .cmp(&a.last_active)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        summaries
    }
}
