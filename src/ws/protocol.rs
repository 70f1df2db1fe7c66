//! Inbound WebSocket protocol: JSON text frames from clients.
//!
//! The only client-initiated event is `register`, which binds the
//! connection to a user identity in the presence registry.

use serde::Deserialize;

use crate::presence::ConnectionHandle;
use crate::state::AppState;

/// Client frame: `{"event": "register", "userId": "..."}`
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum Inbound {
    #[serde(rename_all = "camelCase")]
    Register { user_id: String },
}

/// Handle an incoming text frame. Returns the identity that was registered,
/// if the frame was a valid register event.
///
/// Malformed frames (bad JSON, unknown event, empty identity) are logged
/// and ignored: the connection stays open and its registry state is
/// untouched.
pub fn handle_text_message(
    text: &str,
    state: &AppState,
    handle: &ConnectionHandle,
) -> Option<String> {
    let inbound: Inbound = match serde_json::from_str(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::debug!(
                handle_id = handle.id(),
                error = %e,
                "Ignoring unparseable client frame"
            );
            return None;
        }
    };

    match inbound {
        Inbound::Register { user_id } => {
            let user_id = user_id.trim();
            if user_id.is_empty() {
                tracing::debug!(
                    handle_id = handle.id(),
                    "Ignoring register event with empty identity"
                );
                return None;
            }

            state.registry.register(user_id, handle.clone());
            tracing::info!(
                user_id = %user_id,
                handle_id = handle.id(),
                "Connection registered"
            );
            Some(user_id.to_string())
        }
    }
}
