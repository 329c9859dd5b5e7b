//! Registry of live sessions, keyed by caller-supplied id.
//!
//! Two-level locking: a map lock held only for membership operations, and a
//! per-session entry lock serializing mutations for one id. Nothing in here
//! performs I/O, so neither lock is ever held across a network operation.
//! Membership-coupled mutations (insert, attach, remove, `with_session`)
//! run under the map lock so they cannot interleave for the same id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ConnectError;
use crate::session::{Session, SessionStatus};
use crate::transport::Transport;

/// Map of registered sessions. Owned by the manager instance that created
/// it; there is no process-wide singleton.
pub struct SessionRegistry<T: Transport> {
    sessions: Mutex<HashMap<String, Arc<Mutex<Session<T>>>>>,
}

impl<T: Transport> SessionRegistry<T> {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Register a session under `id`. Rejects duplicates without touching
    /// the existing entry.
    pub fn insert(&self, id: &str, session: Session<T>) -> Result<(), ConnectError> {
        let mut sessions = self.lock_map();
        if sessions.contains_key(id) {
            return Err(ConnectError::SessionExists(id.to_string()));
        }
        sessions.insert(id.to_string(), Arc::new(Mutex::new(session)));
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock_map().contains_key(id)
    }

    /// Attach the negotiated shell channel. Returns `false` if the session
    /// was removed while negotiation was in flight, in which case the caller
    /// owns the channel's cleanup.
    pub fn attach_channel(&self, id: &str, channel: T::Channel) -> bool {
        let sessions = self.lock_map();
        match sessions.get(id) {
            Some(entry) => {
                lock_entry(entry).attach(channel);
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `id` and hand it back. At most one caller ever
    /// receives the entry; this is what makes teardown run exactly once.
    pub fn remove(&self, id: &str) -> Option<Arc<Mutex<Session<T>>>> {
        self.lock_map().remove(id)
    }

    /// Run `f` on the session under its entry lock, if it is still
    /// registered. The map lock is held for the duration, so `f` must be
    /// brief and must not block.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session<T>) -> R) -> Option<R> {
        let sessions = self.lock_map();
        sessions.get(id).map(|entry| f(&mut lock_entry(entry)))
    }

    pub fn status(&self, id: &str) -> Option<SessionStatus> {
        self.with_session(id, |session| session.status())
    }

    /// Ids of all registered sessions, sorted for stable listing.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock_map().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.lock_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_map().is_empty()
    }

    // A poisoned lock means some other thread panicked mid-operation; the
    // map itself is still coherent, so keep going rather than propagate.
    fn lock_map(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<Session<T>>>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> Default for SessionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_entry<T: Transport>(entry: &Arc<Mutex<Session<T>>>) -> MutexGuard<'_, Session<T>> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}
