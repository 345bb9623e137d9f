use std::collections::HashMap;

use log::debug;

use super::{SessionData, SessionKey, SessionProvider};
use crate::PaddockError;

/// Fetch-or-reuse cache in front of a [`SessionProvider`]. Qualifying and race data are
/// requested by several panels, each session is fetched once per (year, race, session type).
/// Failed fetches are not cached.
pub struct SessionCache<P: SessionProvider> {
    provider: P,
    sessions: HashMap<SessionKey, SessionData>,
}

impl<P: SessionProvider> SessionCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            sessions: HashMap::new(),
        }
    }

    pub fn get_or_fetch(&mut self, key: &SessionKey) -> Result<&SessionData, PaddockError> {
        if !self.sessions.contains_key(key) {
            debug!("Fetching session {}", key);
            let session = self.provider.fetch(key)?;
            self.sessions.insert(key.clone(), session);
        } else {
            debug!("Reusing cached session {}", key);
        }
        Ok(&self.sessions[key])
    }

    pub fn is_cached(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Swap the data source, dropping everything fetched from the previous one
    pub fn replace_provider(&mut self, provider: P) {
        self.provider = provider;
        self.sessions.clear();
    }
}
