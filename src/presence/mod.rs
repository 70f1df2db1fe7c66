//! Presence registry: maps logical user identities to live WebSocket
//! connections and pushes request lifecycle events to whichever party is
//! online. Delivery is best-effort, at-most-once; offline recipients are
//! skipped and catch up through the request listing endpoints.

pub mod events;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use events::EventKind;

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push messages to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque reference to one live WebSocket connection.
///
/// A handle has no identity of its own; it becomes associated with a user
/// only once a register event arrives on it. The numeric id is unique for
/// the process lifetime so unregistration can match the exact connection
/// rather than the logical user (a superseded handle disconnecting must not
/// evict its user's newer connection).
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: u64,
    tx: ConnectionSender,
}

impl ConnectionHandle {
    pub fn new(tx: ConnectionSender) -> Self {
        Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            tx,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn sender(&self) -> &ConnectionSender {
        &self.tx
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

/// Identity -> connection mapping, at most one live handle per identity.
///
/// Owned by `AppState` and instantiated once at startup; every WebSocket
/// actor and command handler reaches it through the shared state. All state
/// lives behind a single Mutex so each operation is atomic relative to the
/// others. None of the operations block or perform I/O while holding the
/// lock; registry size is bounded by concurrently connected clients.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    inner: Mutex<HashMap<String, ConnectionHandle>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `identity` with `handle`, replacing any previous mapping
    /// for that identity (last-registered-wins; the superseded handle is
    /// simply discarded, not closed).
    ///
    /// Any entry still pointing at `handle` under a different identity is
    /// cleared first, so a connection is mapped under at most one identity
    /// at a time even if a client re-registers as someone else.
    pub fn register(&self, identity: &str, handle: ConnectionHandle) {
        let mut map = self.inner.lock().expect("presence registry poisoned");
        map.retain(|_, h| h.id != handle.id);
        map.insert(identity.to_string(), handle);
    }

    /// Remove the entry currently stored for `handle`, if any.
    ///
    /// Matched by handle id, never by identity: if the handle was already
    /// superseded by a newer registration for the same user, the newer
    /// mapping stays. Unknown or already-removed handles are a no-op,
    /// which covers duplicate teardown notifications from the transport.
    pub fn unregister(&self, handle: &ConnectionHandle) {
        let mut map = self.inner.lock().expect("presence registry poisoned");
        map.retain(|_, h| h.id != handle.id);
    }

    /// Current live handle for `identity`, or None if they are offline.
    pub fn lookup(&self, identity: &str) -> Option<ConnectionHandle> {
        let map = self.inner.lock().expect("presence registry poisoned");
        map.get(identity).cloned()
    }

    /// Number of currently registered identities.
    pub fn online_count(&self) -> usize {
        let map = self.inner.lock().expect("presence registry poisoned");
        map.len()
    }

    /// Push an event to `identity` if they are online; silently drop it
    /// otherwise. Fire-and-forget: callers get no delivery signal and the
    /// HTTP response path never waits on the socket.
    pub fn deliver(&self, identity: &str, kind: EventKind, payload: serde_json::Value) {
        let Some(handle) = self.lookup(identity) else {
            tracing::debug!(
                identity = %identity,
                event = kind.as_str(),
                "Recipient offline, dropping event"
            );
            return;
        };

        let envelope = events::Envelope {
            event: kind.as_str(),
            payload,
        };
        match serde_json::to_string(&envelope) {
            Ok(text) => {
                // Send failure means the connection died mid-teardown; the
                // actor will unregister it shortly.
                let _ = handle
                    .sender()
                    .send(axum::extract::ws::Message::Text(text.into()));
            }
            Err(e) => {
                tracing::warn!(event = kind.as_str(), error = %e, "Failed to encode event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Message;
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn new_handle() -> (ConnectionHandle, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(tx), rx)
    }

    fn recv_text(rx: &mut UnboundedReceiver<Message>) -> serde_json::Value {
        match rx.try_recv().expect("expected a delivered frame") {
            Message::Text(text) => serde_json::from_str(&text).expect("valid JSON frame"),
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[test]
    fn lookup_returns_most_recent_registration() {
        let registry = PresenceRegistry::new();
        assert!(registry.lookup("u1").is_none());

        let (h1, _rx1) = new_handle();
        let (h2, _rx2) = new_handle();

        registry.register("u1", h1.clone());
        assert_eq!(registry.lookup("u1"), Some(h1.clone()));

        registry.register("u1", h2.clone());
        assert_eq!(registry.lookup("u1"), Some(h2));
        assert_eq!(registry.online_count(), 1);
    }

    #[test]
    fn register_is_idempotent_for_same_pair() {
        let registry = PresenceRegistry::new();
        let (h1, _rx) = new_handle();

        registry.register("u1", h1.clone());
        registry.register("u1", h1.clone());

        assert_eq!(registry.lookup("u1"), Some(h1));
        assert_eq!(registry.online_count(), 1);
    }

    #[test]
    fn unregister_removes_only_the_matching_entry() {
        let registry = PresenceRegistry::new();
        let (h1, _rx1) = new_handle();
        let (h2, _rx2) = new_handle();

        registry.register("u1", h1.clone());
        registry.register("u2", h2.clone());

        registry.unregister(&h1);
        assert!(registry.lookup("u1").is_none());
        assert_eq!(registry.lookup("u2"), Some(h2));
    }

    #[test]
    fn unregister_unknown_handle_is_a_noop() {
        let registry = PresenceRegistry::new();
        let (h1, _rx1) = new_handle();
        let (never_registered, _rx2) = new_handle();

        registry.register("u1", h1.clone());
        registry.unregister(&never_registered);
        assert_eq!(registry.lookup("u1"), Some(h1.clone()));

        // Double teardown: second unregister of the same handle is harmless
        registry.unregister(&h1);
        registry.unregister(&h1);
        assert!(registry.lookup("u1").is_none());
    }

    #[test]
    fn stale_handle_disconnect_does_not_evict_newer_registration() {
        let registry = PresenceRegistry::new();
        let (h1, _rx1) = new_handle();
        let (h2, _rx2) = new_handle();

        // Reconnect: same user registers a second connection, then the old
        // one finally tears down.
        registry.register("u1", h1.clone());
        registry.register("u1", h2.clone());
        registry.unregister(&h1);

        assert_eq!(registry.lookup("u1"), Some(h2));
    }

    #[test]
    fn unregister_after_disconnect_leaves_identity_offline() {
        let registry = PresenceRegistry::new();
        let (h1, _rx1) = new_handle();

        registry.register("u1", h1.clone());
        registry.unregister(&h1);

        assert!(registry.lookup("u1").is_none());
    }

    #[test]
    fn identity_switch_clears_the_old_mapping() {
        let registry = PresenceRegistry::new();
        let (h1, _rx) = new_handle();

        registry.register("alice", h1.clone());
        registry.register("bob", h1.clone());

        assert!(registry.lookup("alice").is_none());
        assert_eq!(registry.lookup("bob"), Some(h1));
        assert_eq!(registry.online_count(), 1);
    }

    #[test]
    fn deliver_sends_exactly_one_frame_to_the_registered_handle() {
        let registry = PresenceRegistry::new();
        let (h1, mut rx) = new_handle();

        registry.register("worker-1", h1);
        registry.deliver("worker-1", EventKind::NewRequest, json!({ "id": 42 }));

        let frame = recv_text(&mut rx);
        assert_eq!(frame["event"], "newRequest");
        assert_eq!(frame["payload"]["id"], 42);
        assert!(rx.try_recv().is_err(), "expected exactly one frame");
    }

    #[test]
    fn deliver_to_offline_identity_is_dropped_silently() {
        let registry = PresenceRegistry::new();
        let (h1, mut rx) = new_handle();
        registry.register("worker-1", h1);

        // worker-2 never registered: no frame anywhere, no panic
        registry.deliver("worker-2", EventKind::NewRequest, json!({ "id": 7 }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn deliver_after_unregister_is_dropped() {
        let registry = PresenceRegistry::new();
        let (h1, mut rx) = new_handle();

        registry.register("u1", h1.clone());
        registry.unregister(&h1);
        registry.deliver("u1", EventKind::StatusUpdate, json!({ "id": 1 }));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn status_update_uses_legacy_wire_name() {
        let registry = PresenceRegistry::new();
        let (h1, mut rx) = new_handle();

        registry.register("u1", h1);
        registry.deliver(
            "u1",
            EventKind::StatusUpdate,
            json!({ "status": "accepted" }),
        );

        let frame = recv_text(&mut rx);
        assert_eq!(frame["event"], "requestStatusUpdate");
        assert_eq!(frame["payload"]["status"], "accepted");
    }
}
