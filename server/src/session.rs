//! Session bookkeeping for connected clients.
//!
//! One `Session` per connected client, keyed by the remote address. The
//! accept loop inserts sessions; the main loop removes them when a
//! `UserDisconnected` command arrives or a receive task reports its stream
//! closed. The write half of each connection lives here, so dropping a
//! session closes the socket and lets the peer's blocked read unblock.

use log::{info, warn};
use shared::framing;
use std::collections::HashMap;
use tokio::net::tcp::OwnedWriteHalf;

/// Server-side bookkeeping for one connected client.
pub struct Session {
    pub addr: String,
    pub writer: OwnedWriteHalf,
}

/// All currently connected clients behind one table.
pub struct SessionManager {
    sessions: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Inserts a session for `addr`, replacing any stale one from the same
    /// address (the old write half is dropped, closing its socket).
    pub fn add_session(&mut self, addr: String, writer: OwnedWriteHalf) {
        info!("Client connected from {}", addr);
        let stale = self.sessions.insert(
            addr.clone(),
            Session {
                addr: addr.clone(),
                writer,
            },
        );
        if stale.is_some() {
            warn!("Replaced stale session for {}", addr);
        }
    }

    /// Removes and drops the session for `addr`. Returns whether a session
    /// was present.
    pub fn remove_session(&mut self, addr: &str) -> bool {
        if self.sessions.remove(addr).is_some() {
            info!("Client {} disconnected", addr);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.sessions.contains_key(addr)
    }

    pub fn addrs(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sends one frame to `addr`. Silently no-ops (returning false) when the
    /// address has no session, which covers clients that already left.
    pub async fn send_to(&mut self, addr: &str, command: &str, payload: &[u8]) -> bool {
        match self.sessions.get_mut(addr) {
            Some(session) => {
                match framing::write_frame(&mut session.writer, command, payload).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Failed to send {} to {}: {}", command, addr, e);
                        false
                    }
                }
            }
            None => false,
        }
    }

    /// Sends one frame to every currently known session. Per-session send
    /// failures are logged and skipped.
    pub async fn broadcast(&mut self, command: &str, payload: &[u8]) {
        for session in self.sessions.values_mut() {
            if let Err(e) = framing::write_frame(&mut session.writer, command, payload).await {
                warn!("Failed to broadcast {} to {}: {}", command, session.addr, e);
            }
        }
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
