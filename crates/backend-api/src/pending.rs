use std::{collections::HashMap, fmt, sync::Arc, time::Duration as StdDuration, time::Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const DEFAULT_PENDING_TTL: StdDuration = StdDuration::from_secs(300);

/// Wrong codes tolerated per entry before it is dropped.
pub const MAX_CODE_ATTEMPTS: u32 = 5;

/// The account a visitor asked for, held until the emailed code is confirmed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationPayload {
    pub name: String,
    pub email: String,
    pub user_name: String,
    pub password: String,
}

impl fmt::Debug for RegistrationPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationPayload")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    /// No live entry for the email: never registered, expired or already verified.
    NotFound,
    /// An entry exists but the submitted code differs. The entry is kept.
    Mismatch,
    /// The code differed and the entry ran out of attempts, so it was dropped.
    Exhausted,
}

struct PendingEntry {
    code: String,
    payload: RegistrationPayload,
    expires_at: Instant,
    attempts: u32,
}

/// An entry removed by a successful [`PendingRegistrationStore::take`].
///
/// If the account cannot be created, hand it back with
/// [`PendingRegistrationStore::restore`]; it keeps its original deadline.
pub struct Redeemed {
    pub payload: RegistrationPayload,
    code: String,
    expires_at: Instant,
    attempts: u32,
}

impl PendingEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Unverified registrations keyed by email.
///
/// Code and payload live in one entry with one absolute deadline, so they
/// always expire together. Every operation holds the lock for its whole
/// duration; a `put` is never half-visible to a concurrent `get_code`.
#[derive(Clone)]
pub struct PendingRegistrationStore {
    inner: Arc<Mutex<HashMap<String, PendingEntry>>>,
    ttl: StdDuration,
}

impl PendingRegistrationStore {
    pub fn new(ttl: StdDuration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> StdDuration {
        self.ttl
    }

    /// Store `code` and `payload` for `email`, replacing any earlier entry.
    pub async fn put(&self, email: &str, code: &str, payload: RegistrationPayload) {
        let expires_at = Instant::now()
            .checked_add(self.ttl)
            .unwrap_or_else(far_future);

        let mut guard = self.inner.lock().await;
        let replaced = guard
            .insert(
                email.to_string(),
                PendingEntry {
                    code: code.to_string(),
                    payload,
                    expires_at,
                    attempts: 0,
                },
            )
            .is_some();
        debug!(replaced, "stored pending registration");
    }

    pub async fn get_code(&self, email: &str) -> Option<String> {
        let guard = self.inner.lock().await;
        let now = Instant::now();
        guard
            .get(email)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.code.clone())
    }

    pub async fn get_payload(&self, email: &str) -> Option<RegistrationPayload> {
        let guard = self.inner.lock().await;
        let now = Instant::now();
        guard
            .get(email)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.payload.clone())
    }

    /// Remove and return the entry if `code` matches the live entry exactly.
    ///
    /// Check and removal happen under one lock, so a code can be redeemed once.
    /// Every mismatch counts against the entry; after [`MAX_CODE_ATTEMPTS`]
    /// wrong codes it is dropped.
    pub async fn take(&self, email: &str, code: &str) -> Result<Redeemed, TakeError> {
        let mut guard = self.inner.lock().await;
        let now = Instant::now();

        let Some(entry) = guard.get_mut(email) else {
            return Err(TakeError::NotFound);
        };
        if !entry.is_live(now) {
            guard.remove(email);
            return Err(TakeError::NotFound);
        }
        if entry.code != code {
            entry.attempts += 1;
            if entry.attempts >= MAX_CODE_ATTEMPTS {
                guard.remove(email);
                warn!("too many wrong verification codes, pending registration dropped");
                return Err(TakeError::Exhausted);
            }
            return Err(TakeError::Mismatch);
        }

        guard
            .remove(email)
            .map(|entry| Redeemed {
                payload: entry.payload,
                code: entry.code,
                expires_at: entry.expires_at,
                attempts: entry.attempts,
            })
            .ok_or(TakeError::NotFound)
    }

    /// Put a redeemed entry back under its original deadline.
    ///
    /// Returns `false` without touching the store when the deadline has
    /// passed or a newer registration for `email` has arrived meanwhile.
    pub async fn restore(&self, email: &str, redeemed: Redeemed) -> bool {
        let mut guard = self.inner.lock().await;
        if Instant::now() >= redeemed.expires_at || guard.contains_key(email) {
            return false;
        }

        guard.insert(
            email.to_string(),
            PendingEntry {
                code: redeemed.code,
                payload: redeemed.payload,
                expires_at: redeemed.expires_at,
                attempts: redeemed.attempts,
            },
        );
        true
    }

    /// Drop every expired entry and return how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.lock().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, entry| entry.is_live(now));
        before - guard.len()
    }

    /// Entries currently held, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

impl Default for PendingRegistrationStore {
    fn default() -> Self {
        Self::new(DEFAULT_PENDING_TTL)
    }
}

fn far_future() -> Instant {
    // ~30 years; `Instant` has no MAX.
    Instant::now() + StdDuration::from_secs(60 * 60 * 24 * 365 * 30)
}
