use std::sync::Mutex;

use fsim_core::{Error, Result};
use tokio::sync::mpsc;

/// Frames queued for delivery over an open streaming connection.
pub type SessionSender = mpsc::Sender<String>;
pub type SessionReceiver = mpsc::Receiver<String>;

struct ActiveSession {
    id: String,
    tx: SessionSender,
}

/// Single-slot admission control for the streaming transport.
///
/// At most one session is active process-wide; a second concurrent attempt is
/// rejected outright rather than queued. Passed explicitly into the HTTP
/// handlers instead of living as ambient module state.
#[derive(Default)]
pub struct SessionRegistry {
    active: Mutex<Option<ActiveSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the session slot, returning the new session id and the receive
    /// side of its outgoing frame queue.
    pub fn open(&self) -> Result<(String, SessionReceiver)> {
        let mut slot = self.active.lock().unwrap();
        if slot.is_some() {
            return Err(Error::TransportConflict);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(32);
        *slot = Some(ActiveSession { id: id.clone(), tx });
        tracing::debug!(session_id = %id, "streaming session opened");
        Ok((id, rx))
    }

    /// Looks up the sender for a posted message's session id.
    pub fn sender(&self, session_id: &str) -> Result<SessionSender> {
        match &*self.active.lock().unwrap() {
            Some(session) if session.id == session_id => Ok(session.tx.clone()),
            _ => Err(Error::Routing(session_id.to_string())),
        }
    }

    /// Frees the slot if `session_id` still owns it.
    pub fn close(&self, session_id: &str) {
        let mut slot = self.active.lock().unwrap();
        if slot.as_ref().is_some_and(|s| s.id == session_id) {
            tracing::debug!(session_id, "streaming session closed");
            *slot = None;
        }
    }

    pub fn active_id(&self) -> Option<String> {
        self.active.lock().unwrap().as_ref().map(|s| s.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_session_is_rejected_and_first_unaffected() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.open().unwrap();

        match registry.open() {
            Err(Error::TransportConflict) => {}
            other => panic!("expected conflict, got {other:?}"),
        }

        // The original session still routes.
        assert!(registry.sender(&id).is_ok());
        assert_eq!(registry.active_id(), Some(id));
    }

    #[test]
    fn unknown_session_id_fails_routing() {
        let registry = SessionRegistry::new();
        let (_id, _rx) = registry.open().unwrap();
        match registry.sender("nope") {
            Err(Error::Routing(id)) => assert_eq!(id, "nope"),
            other => panic!("expected routing error, got {other:?}"),
        }
    }

    #[test]
    fn closing_frees_the_slot() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.open().unwrap();
        registry.close(&id);
        assert!(registry.active_id().is_none());
        assert!(registry.open().is_ok());
    }

    #[test]
    fn close_with_stale_id_keeps_current_session() {
        let registry = SessionRegistry::new();
        let (first, _rx) = registry.open().unwrap();
        registry.close(&first);
        let (second, _rx2) = registry.open().unwrap();

        registry.close(&first);
        assert_eq!(registry.active_id(), Some(second));
    }
}
