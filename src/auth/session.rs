//! Server-side session store and the two-state session machine.
//!
//! A session record is either `Anonymous` or `Authenticated`, carries a
//! per-session CSRF token and a one-shot flash queue, and expires after a
//! fixed idle lifetime. Identity is handed to handlers explicitly through
//! the extractors in [`crate::auth::extractors`]; nothing here touches
//! request-global state.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::{distributions::Alphanumeric, Rng};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated { user_id: Uuid, username: String },
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub identity: Identity,
    pub csrf_token: String,
    flashes: Vec<String>,
    expires_at: OffsetDateTime,
}

/// Token-keyed session map. Expired records are pruned lazily on access;
/// a live access slides the expiry forward by the full lifetime.
pub struct SessionStore {
    lifetime: Duration,
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

impl SessionStore {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn fresh_record(&self) -> SessionRecord {
        SessionRecord {
            identity: Identity::Anonymous,
            csrf_token: new_token(),
            flashes: Vec::new(),
            expires_at: OffsetDateTime::now_utc() + self.lifetime,
        }
    }

    /// Return the live record for `token`, creating a new anonymous session
    /// when the token is absent, unknown, or expired. The returned token is
    /// what the response cookie must carry.
    ///
    /// Every call also sweeps expired records, so sessions abandoned by
    /// clients that never present their cookie again still get reclaimed.
    pub fn open(&self, token: Option<&str>) -> (String, SessionRecord) {
        let mut map = self.lock();
        let now = OffsetDateTime::now_utc();
        map.retain(|_, record| record.expires_at > now);
        if let Some(token) = token {
            if let Some(record) = self.live(&mut map, token) {
                let snapshot = record.clone();
                return (token.to_string(), snapshot);
            }
        }
        let token = new_token();
        let record = self.fresh_record();
        map.insert(token.clone(), record.clone());
        (token, record)
    }

    /// Current identity for `token`; `Anonymous` when the session is
    /// missing or has outlived its lifetime.
    pub fn identity(&self, token: &str) -> Identity {
        let mut map = self.lock();
        match self.live(&mut map, token) {
            Some(record) => record.identity.clone(),
            None => Identity::Anonymous,
        }
    }

    /// Transition to `Authenticated`. Only called after the credential
    /// check has already passed. The token is rotated: the pre-login token
    /// is discarded so a planted cookie never becomes an authenticated one,
    /// and the returned token is what the response cookie must carry.
    pub fn login(&self, token: &str, user_id: Uuid, username: &str) -> String {
        let mut record = self.fresh_record();
        record.identity = Identity::Authenticated {
            user_id,
            username: username.to_string(),
        };
        let rotated = new_token();
        let mut map = self.lock();
        map.remove(token);
        map.insert(rotated.clone(), record);
        rotated
    }

    /// Unconditional transition to `Anonymous`, discarding every session
    /// attribute (flashes included, CSRF token regenerated).
    pub fn logout(&self, token: &str) {
        let fresh = self.fresh_record();
        let mut map = self.lock();
        if let Some(record) = map.get_mut(token) {
            *record = fresh;
        }
    }

    pub fn push_flash(&self, token: &str, message: impl Into<String>) {
        let mut map = self.lock();
        if let Some(record) = self.live(&mut map, token) {
            record.flashes.push(message.into());
        }
    }

    /// Drain the one-shot flash queue.
    pub fn take_flashes(&self, token: &str) -> Vec<String> {
        let mut map = self.lock();
        match self.live(&mut map, token) {
            Some(record) => std::mem::take(&mut record.flashes),
            None => Vec::new(),
        }
    }

    fn live<'a>(
        &self,
        map: &'a mut HashMap<String, SessionRecord>,
        token: &str,
    ) -> Option<&'a mut SessionRecord> {
        let now = OffsetDateTime::now_utc();
        let expired = match map.get(token) {
            Some(record) => record.expires_at <= now,
            None => return None,
        };
        if expired {
            map.remove(token);
            return None;
        }
        let record = map.get_mut(token)?;
        record.expires_at = now + self.lifetime;
        Some(record)
    }

    /// Number of records currently held, expired or not.
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionRecord>> {
        self.sessions.lock().expect("session store mutex poisoned")
    }
}
