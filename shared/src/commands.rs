//! Command names and the dispatch table shared by both peers.

use log::{info, warn};
use std::collections::HashMap;

pub const USER_CONNECTED: &str = "UserConnected";
pub const USER_DISCONNECTED: &str = "UserDisconnected";
pub const MESSAGE: &str = "Message";
pub const WRITE_TO_LEADERBOARD: &str = "WriteToLeaderboard";
pub const SEND_LEADERBOARD: &str = "SendLeaderboard";

/// Handler invoked with the peer address and the raw fixed-size payload.
/// Handlers run synchronously on the receive loop; anything that needs the
/// main loop forwards a typed message through a channel instead of blocking.
pub type CommandHandler = Box<dyn Fn(&str, &[u8]) + Send + Sync>;

/// Maps command names to handlers. Built once at construction and never
/// mutated afterwards.
pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler under `name`. Registering the same name twice is
    /// a programmer error and panics.
    pub fn register(&mut self, name: &str, handler: CommandHandler) {
        if self.handlers.insert(name.to_string(), handler).is_some() {
            panic!("command '{name}' registered twice");
        }
    }

    /// Looks up `name` and invokes its handler on the calling thread.
    /// Unknown and empty command names are logged and dropped; the
    /// connection stays alive either way.
    pub fn dispatch(&self, peer_addr: &str, name: &str, payload: &[u8]) {
        if name.is_empty() {
            warn!("{} : no command given", peer_addr);
            return;
        }

        info!("{} : {}", peer_addr, name);

        match self.handlers.get(name) {
            Some(handler) => handler(peer_addr, payload),
            None => warn!("{} : unknown command '{}'", peer_addr, name),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn dispatch_invokes_registered_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let mut registry = CommandRegistry::new();
        registry.register(
            MESSAGE,
            Box::new(move |addr, payload| {
                assert_eq!(addr, "127.0.0.1:5000");
                assert_eq!(payload, b"abc");
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        registry.dispatch("127.0.0.1:5000", MESSAGE, b"abc");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_command_is_dropped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let mut registry = CommandRegistry::new();
        registry.register(
            MESSAGE,
            Box::new(move |_, _| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        registry.dispatch("peer", "NoSuchCommand", &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_command_is_dropped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let mut registry = CommandRegistry::new();
        registry.register(
            MESSAGE,
            Box::new(move |_, _| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        registry.dispatch("peer", "", &[]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let mut registry = CommandRegistry::new();
        registry.register(MESSAGE, Box::new(|_, _| {}));
        registry.register(MESSAGE, Box::new(|_, _| {}));
    }

    #[test]
    fn registry_reports_size() {
        let mut registry = CommandRegistry::new();
        assert!(registry.is_empty());
        registry.register(USER_CONNECTED, Box::new(|_, _| {}));
        registry.register(USER_DISCONNECTED, Box::new(|_, _| {}));
        assert_eq!(registry.len(), 2);
    }
}
