use hangman_types::PlayerId;
use std::collections::HashMap;
use std::hash::Hash;

/// Which live transport currently speaks for each session.
///
/// At most one transport per session and one session per transport. Never
/// persisted: after a restart it starts empty and is rebuilt as clients
/// re-join.
#[derive(Debug, Clone)]
pub struct ConnectionRegistry<T> {
    by_session: HashMap<PlayerId, T>,
    by_transport: HashMap<T, PlayerId>,
}

impl<T> Default for ConnectionRegistry<T> {
    fn default() -> Self {
        Self {
            by_session: HashMap::new(),
            by_transport: HashMap::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> ConnectionRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `session` to `transport`, silently dropping whatever either side
    /// was bound to before.
    pub fn bind(&mut self, session: &str, transport: T) {
        if let Some(old_transport) = self.by_session.remove(session) {
            self.by_transport.remove(&old_transport);
        }
        if let Some(old_session) = self.by_transport.remove(&transport) {
            self.by_session.remove(&old_session);
        }
        self.by_session.insert(session.to_string(), transport.clone());
        self.by_transport.insert(transport, session.to_string());
    }

    pub fn session_for(&self, transport: &T) -> Option<&PlayerId> {
        self.by_transport.get(transport)
    }

    pub fn transport_for(&self, session: &str) -> Option<&T> {
        self.by_session.get(session)
    }

    pub fn release_session(&mut self, session: &str) -> Option<T> {
        let transport = self.by_session.remove(session)?;
        self.by_transport.remove(&transport);
        Some(transport)
    }

    pub fn release_transport(&mut self, transport: &T) -> Option<PlayerId> {
        let session = self.by_transport.remove(transport)?;
        self.by_session.remove(&session);
        Some(session)
    }

    pub fn clear(&mut self) {
        self.by_session.clear();
        self.by_transport.clear();
    }

    pub fn len(&self) -> usize {
        self.by_session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_session.is_empty()
    }
}
