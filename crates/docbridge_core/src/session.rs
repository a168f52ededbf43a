//! Session handles.
//!
//! Engines built on this crate have no session or transaction semantics.
//! These types exist so that callers written against a session-aware driver
//! contract can pass them; the adapter forwards or discards them.

use uuid::Uuid;

/// Per-operation session context forwarded to commands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionContext {
    /// Logical session id, if the caller opened one.
    pub session_id: Option<Uuid>,
    /// Whether the caller asked for causal consistency.
    pub causally_consistent: bool,
}

impl SessionContext {
    /// A context without a session.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A context bound to a fresh session id.
    #[must_use]
    pub fn with_new_session() -> Self {
        Self {
            session_id: Some(Uuid::new_v4()),
            causally_consistent: false,
        }
    }

    /// Returns true if a session id is present.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }
}

/// A client-side session handle accepted by the operation executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    id: Uuid,
}

impl ClientSession {
    /// Starts a new session handle.
    #[must_use]
    pub fn start() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// The session id.
    #[must_use]
    pub fn id(&self) -> &Uuid {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_context_defaults_to_none() {
        assert!(!SessionContext::none().has_session());
        assert!(SessionContext::with_new_session().has_session());
    }

    #[test]
    fn client_sessions_have_distinct_ids() {
        assert_ne!(ClientSession::start().id(), ClientSession::start().id());
    }
}
