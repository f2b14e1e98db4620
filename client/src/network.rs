//! Client connection management and the intent-level send API.
//!
//! One outbound TCP connection, one background receive task. Incoming
//! frames are dispatched through the client's own command registry; the
//! handlers fill the pending-entries holding area and the event queue. The
//! holding area is a request/response rendezvous, not a cache: reading a
//! level's entries removes them.

use crate::events::ClientEvent;
use log::warn;
use shared::{codec, commands, framing, CommandRegistry, LevelId, PlayerEntry, SortMethod};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

pub struct Client {
    server_addr: Option<String>,
    writer: Option<OwnedWriteHalf>,
    receive_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    connected: Arc<AtomicBool>,
    pending_entries: Arc<Mutex<HashMap<LevelId, Vec<PlayerEntry>>>>,
    events: Arc<Mutex<Vec<ClientEvent>>>,
}

impl Client {
    pub fn new() -> Self {
        Self {
            server_addr: None,
            writer: None,
            receive_handle: None,
            shutdown_tx: None,
            connected: Arc::new(AtomicBool::new(false)),
            pending_entries: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Opens a TCP connection to `addr`, giving up after `timeout_secs`.
    /// Timeouts, refusals and other socket errors each produce a distinct
    /// error event; every failure leaves the client simply "not connected".
    /// Returns whether the connection was established.
    pub async fn connect(&mut self, addr: &str, timeout_secs: u64) -> bool {
        if self.is_connected() {
            return true;
        }

        let attempt = timeout(
            Duration::from_secs(timeout_secs),
            TcpStream::connect(addr),
        )
        .await;

        let stream = match attempt {
            Err(_) => {
                self.push_event(ClientEvent::Error {
                    message: format!("Connection to {addr} timed out after {timeout_secs}s"),
                });
                return false;
            }
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                self.push_event(ClientEvent::Error {
                    message: format!("Connection refused by {addr}"),
                });
                return false;
            }
            Ok(Err(e)) => {
                self.push_event(ClientEvent::Error {
                    message: format!("Failed to connect to {addr}: {e}"),
                });
                return false;
            }
            Ok(Ok(stream)) => stream,
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let (reader, writer) = stream.into_split();
        self.writer = Some(writer);
        self.server_addr = Some(addr.to_string());
        self.connected.store(true, Ordering::SeqCst);
        self.push_event(ClientEvent::ConnectionStatus { connected: true });
        self.push_event(ClientEvent::Log {
            message: format!("Connected to {addr}"),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);
        self.receive_handle = Some(self.spawn_receive_loop(addr.to_string(), reader, shutdown_rx));

        true
    }

    /// Spawns the background receive loop. The loop exits when the server
    /// closes the stream, a `UserDisconnected` frame is processed, or the
    /// local shutdown signal fires; the socket is closed rather than the
    /// task killed.
    fn spawn_receive_loop(
        &self,
        addr: String,
        mut reader: OwnedReadHalf,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> JoinHandle<()> {
        let registry = self.build_registry();
        let connected = Arc::clone(&self.connected);
        let events = Arc::clone(&self.events);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = framing::read_frame(&mut reader) => match result {
                        Ok(frame) => {
                            registry.dispatch(&addr, &frame.command, &frame.payload);
                            // A UserDisconnected handler clears the flag.
                            if !connected.load(Ordering::SeqCst) {
                                break;
                            }
                        }
                        Err(e) => {
                            if connected.swap(false, Ordering::SeqCst) {
                                if e.kind() == ErrorKind::UnexpectedEof {
                                    push_event(&events, ClientEvent::Log {
                                        message: format!("Server {addr} closed the connection"),
                                    });
                                } else {
                                    push_event(&events, ClientEvent::Error {
                                        message: format!("Connection to {addr} lost: {e}"),
                                    });
                                }
                                push_event(&events, ClientEvent::ConnectionStatus {
                                    connected: false,
                                });
                            }
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Builds the client-side command table. Handlers only touch the event
    /// queue and the holding area, never the socket.
    fn build_registry(&self) -> CommandRegistry {
        let mut registry = CommandRegistry::new();

        let events = Arc::clone(&self.events);
        registry.register(
            commands::USER_CONNECTED,
            Box::new(move |_addr, _payload| {
                push_event(
                    &events,
                    ClientEvent::Log {
                        message: "A user connected to the server".to_string(),
                    },
                );
            }),
        );

        let events = Arc::clone(&self.events);
        let connected = Arc::clone(&self.connected);
        registry.register(
            commands::USER_DISCONNECTED,
            Box::new(move |_addr, _payload| {
                if connected.swap(false, Ordering::SeqCst) {
                    push_event(
                        &events,
                        ClientEvent::Log {
                            message: "Disconnected by the server".to_string(),
                        },
                    );
                    push_event(&events, ClientEvent::ConnectionStatus { connected: false });
                }
            }),
        );

        let events = Arc::clone(&self.events);
        registry.register(
            commands::MESSAGE,
            Box::new(move |addr, payload| match codec::decode_message(payload) {
                Ok(text) => push_event(&events, ClientEvent::Message { text }),
                Err(e) => {
                    warn!("{} : malformed Message payload: {}", addr, e);
                    push_event(
                        &events,
                        ClientEvent::Error {
                            message: format!("Malformed message from server: {e}"),
                        },
                    );
                }
            }),
        );

        let events = Arc::clone(&self.events);
        let pending = Arc::clone(&self.pending_entries);
        registry.register(
            commands::SEND_LEADERBOARD,
            Box::new(move |addr, payload| match codec::decode_entry_list(payload) {
                Ok((level, entries)) => {
                    if let Ok(mut map) = pending.lock() {
                        map.insert(level, entries);
                    }
                }
                Err(e) => {
                    warn!("{} : malformed SendLeaderboard payload: {}", addr, e);
                    push_event(
                        &events,
                        ClientEvent::Error {
                            message: format!("Malformed leaderboard reply: {e}"),
                        },
                    );
                }
            }),
        );

        registry
    }

    /// True only while the socket exists and no close has been observed.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.writer.is_some()
    }

    pub async fn send_user_connected(&mut self) {
        self.send_command(commands::USER_CONNECTED, &[]).await;
    }

    pub async fn send_user_disconnected(&mut self) {
        self.send_command(commands::USER_DISCONNECTED, &[]).await;
    }

    pub async fn send_write_to_leaderboard(&mut self, level: LevelId, entry: &PlayerEntry) {
        match codec::encode_level_entry(level, entry) {
            Ok(payload) => {
                self.send_command(commands::WRITE_TO_LEADERBOARD, &payload)
                    .await
            }
            Err(e) => self.push_event(ClientEvent::Error {
                message: format!("Failed to encode leaderboard entry: {e}"),
            }),
        }
    }

    pub async fn send_leaderboard_request(
        &mut self,
        level: LevelId,
        count: i32,
        start_index: i32,
        sort_method: SortMethod,
    ) {
        match codec::encode_leaderboard_request(level, count, start_index, sort_method) {
            Ok(payload) => self.send_command(commands::SEND_LEADERBOARD, &payload).await,
            Err(e) => self.push_event(ClientEvent::Error {
                message: format!("Failed to encode leaderboard request: {e}"),
            }),
        }
    }

    /// Destructive read: returns and removes whatever entries have arrived
    /// for `level` since the last call. Empty when no reply is pending.
    pub fn take_leaderboard_entries(&mut self, level: LevelId) -> Vec<PlayerEntry> {
        match self.pending_entries.lock() {
            Ok(mut map) => map.remove(&level).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Returns and clears all queued events.
    pub fn drain_events(&mut self) -> Vec<ClientEvent> {
        match self.events.lock() {
            Ok(mut list) => std::mem::take(&mut *list),
            Err(_) => Vec::new(),
        }
    }

    /// Local teardown only: closes the socket and stops the receive loop
    /// without telling the server anything.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.writer = None;
        self.receive_handle = None;
        self.server_addr = None;

        if self.connected.swap(false, Ordering::SeqCst) {
            self.push_event(ClientEvent::ConnectionStatus { connected: false });
        }
    }

    /// Notifies the server with `UserDisconnected`, then tears down locally.
    pub async fn disconnect_from_server(&mut self) {
        self.send_user_disconnected().await;
        self.disconnect();
    }

    /// Writes one frame; a silent no-op while not connected.
    async fn send_command(&mut self, command: &str, payload: &[u8]) {
        if !self.is_connected() {
            return;
        }

        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = framing::write_frame(writer, command, payload).await {
                warn!("Failed to send {}: {}", command, e);
                self.push_event(ClientEvent::Error {
                    message: format!("Failed to send {command}: {e}"),
                });
            }
        }
    }

    fn push_event(&self, event: ClientEvent) {
        push_event(&self.events, event);
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

fn push_event(events: &Mutex<Vec<ClientEvent>>, event: ClientEvent) {
    if let Ok(mut list) = events.lock() {
        list.push(event);
    }
}
