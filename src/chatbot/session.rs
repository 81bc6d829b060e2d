//! Per-conversation state and the registry that owns it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// A session belongs to one user in one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: i64,
    pub chat_id: i64,
}

/// Where a conversation currently waits for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    FoodConfirm,
    FoodAskFood,
    FoodAskLocation,
    JokeConfirm,
    JokeChooseKind,
    JokeKnockKnock,
    JokeWho,
}

/// One in-progress flow.
#[derive(Debug, Clone)]
pub struct Session {
    pub key: SessionKey,
    pub state: FlowState,
    /// Free-text answers in the order they were collected.
    pub answers: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: SessionKey, state: FlowState) -> Self {
        Self {
            key,
            state,
            answers: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn elapsed_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// Active sessions keyed by (user, chat).
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionKey, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the session for `key`, if any.
    pub fn take(&mut self, key: &SessionKey) -> Option<Session> {
        self.sessions.remove(key)
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.key, session);
    }

    #[cfg(test)]
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    #[cfg(test)]
    pub fn state_of(&self, key: &SessionKey) -> Option<FlowState> {
        self.sessions.get(key).map(|s| s.state)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(user_id: i64, chat_id: i64) -> SessionKey {
        SessionKey { user_id, chat_id }
    }

    #[test]
    fn test_insert_and_take() {
        let mut registry = SessionRegistry::new();
        registry.insert(Session::new(key(1, 10), FlowState::FoodConfirm));

        assert!(registry.contains(&key(1, 10)));
        assert_eq!(registry.state_of(&key(1, 10)), Some(FlowState::FoodConfirm));

        let session = registry.take(&key(1, 10)).unwrap();
        assert_eq!(session.state, FlowState::FoodConfirm);
        assert_eq!(registry.len(), 0);
        assert!(registry.take(&key(1, 10)).is_none());
    }

    #[test]
    fn test_keys_are_isolated() {
        let mut registry = SessionRegistry::new();
        registry.insert(Session::new(key(1, 10), FlowState::FoodConfirm));
        registry.insert(Session::new(key(1, 20), FlowState::JokeConfirm));
        registry.insert(Session::new(key(2, 10), FlowState::JokeConfirm));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.state_of(&key(1, 20)), Some(FlowState::JokeConfirm));
        assert!(!registry.contains(&key(2, 20)));
    }

    #[test]
    fn test_insert_replaces_same_key() {
        let mut registry = SessionRegistry::new();
        registry.insert(Session::new(key(1, 10), FlowState::FoodConfirm));
        let mut next = Session::new(key(1, 10), FlowState::FoodAskFood);
        next.answers.push("pizza".to_string());
        registry.insert(next);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.state_of(&key(1, 10)), Some(FlowState::FoodAskFood));
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new(key(1, 10), FlowState::JokeConfirm);
        assert!(session.answers.is_empty());
        assert!(session.elapsed_secs() >= 0);
    }
}
