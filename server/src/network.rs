//! Server network layer: accept loop, per-connection receive tasks and the
//! main command loop.
//!
//! Each accepted connection gets its own receive task that reads frames and
//! dispatches them through the shared command registry. Handlers run on the
//! receive task and only translate payloads into typed [`ServerMessage`]
//! values sent over a channel; the main loop owns all replies and all
//! leaderboard mutation. The leaderboard lock is held across file writes but
//! never across a socket write.

use crate::session::SessionManager;
use crate::store::LeaderboardStore;
use log::{debug, error, info, warn};
use shared::{codec, commands, framing, BoxError, CommandRegistry, LevelId, PlayerEntry, SortMethod};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Messages sent from receive tasks to the main server loop.
#[derive(Debug)]
pub enum ServerMessage {
    /// A client announced itself with `UserConnected`.
    Connected { addr: String },
    /// A client announced departure with `UserDisconnected`.
    Disconnected { addr: String },
    /// Decoded `WriteToLeaderboard` payload.
    WriteEntry {
        addr: String,
        level: LevelId,
        entry: PlayerEntry,
    },
    /// Decoded `SendLeaderboard` request.
    LeaderboardRequest {
        addr: String,
        level: LevelId,
        count: i32,
        start_index: i32,
        sort_method: SortMethod,
    },
    /// A receive task observed its stream close.
    SessionClosed { addr: String },
    Shutdown,
}

/// Main server coordinating the accept loop, sessions and leaderboards.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    sessions: Arc<RwLock<SessionManager>>,
    leaderboards: Arc<RwLock<LeaderboardStore>>,
    registry: Arc<CommandRegistry>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    accept_shutdown_tx: Option<oneshot::Sender<()>>,
}

impl Server {
    /// Binds the listener and loads persisted leaderboards from `data_dir`.
    pub async fn bind(addr: &str, data_dir: &Path) -> Result<Self, BoxError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(build_registry(server_tx.clone()));

        Ok(Server {
            listener: Some(listener),
            local_addr,
            sessions: Arc::new(RwLock::new(SessionManager::new())),
            leaderboards: Arc::new(RwLock::new(LeaderboardStore::load(data_dir))),
            registry,
            server_tx,
            server_rx,
            accept_shutdown_tx: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Channel handle for injecting control messages, notably `Shutdown`.
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Shared view of the session table.
    pub fn sessions(&self) -> Arc<RwLock<SessionManager>> {
        Arc::clone(&self.sessions)
    }

    /// Runs the accept loop and the main command loop until `Shutdown` or
    /// ctrl-c. On the way out the listener is closed and every session
    /// receives a final `UserDisconnected` broadcast.
    pub async fn run(&mut self) -> Result<(), BoxError> {
        let listener = self
            .listener
            .take()
            .ok_or("server is already running")?;
        let (accept_shutdown_tx, accept_shutdown_rx) = oneshot::channel();
        self.accept_shutdown_tx = Some(accept_shutdown_tx);
        self.spawn_accept_loop(listener, accept_shutdown_rx);

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                        Some(message) => self.handle_message(message).await,
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Received ctrl-c, shutting down");
                    break;
                },
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Spawns the single long-lived accept loop. Each accepted connection is
    /// registered in the session table and gets its own receive task. The
    /// loop exits when the shutdown signal fires, dropping the listener and
    /// closing the port.
    fn spawn_accept_loop(&self, listener: TcpListener, mut shutdown_rx: oneshot::Receiver<()>) {
        let sessions = Arc::clone(&self.sessions);
        let registry = Arc::clone(&self.registry);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            if let Err(e) = stream.set_nodelay(true) {
                                warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                            }

                            let addr = peer.to_string();
                            let (read_half, write_half) = stream.into_split();

                            {
                                let mut sessions = sessions.write().await;
                                sessions.add_session(addr.clone(), write_half);
                            }

                            spawn_receive_loop(
                                addr,
                                read_half,
                                Arc::clone(&registry),
                                server_tx.clone(),
                            );
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                }
            }
        });
    }

    async fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Connected { addr } => {
                let text = format!("{} joined the leaderboard server", addr);
                match codec::encode_message(&text) {
                    Ok(payload) => {
                        let mut sessions = self.sessions.write().await;
                        sessions.send_to(&addr, commands::MESSAGE, &payload).await;
                    }
                    Err(e) => error!("Failed to encode join message: {}", e),
                }
            }

            ServerMessage::Disconnected { addr } | ServerMessage::SessionClosed { addr } => {
                let mut sessions = self.sessions.write().await;
                sessions.remove_session(&addr);
            }

            ServerMessage::WriteEntry { addr, level, entry } => {
                // Mutation and the file write share the store lock so the
                // persisted file never lags the in-memory board.
                let mut store = self.leaderboards.write().await;
                match store.add_entry(level, entry) {
                    Ok(true) => {}
                    Ok(false) => debug!("{} : entry rejected for level {:?}", addr, level),
                    Err(e) => error!("Failed to persist leaderboard {:?}: {}", level, e),
                }
            }

            ServerMessage::LeaderboardRequest {
                addr,
                level,
                count,
                start_index,
                sort_method,
            } => {
                let entries = self
                    .collect_entries(level, count, start_index, sort_method)
                    .await;
                match codec::encode_entry_list(level, count, &entries) {
                    Ok(payload) => {
                        let mut sessions = self.sessions.write().await;
                        sessions
                            .send_to(&addr, commands::SEND_LEADERBOARD, &payload)
                            .await;
                    }
                    Err(e) => error!("Failed to encode leaderboard reply: {}", e),
                }
            }

            ServerMessage::Shutdown => {}
        }
    }

    /// Reads entries for a request. When the canonical board already uses
    /// the requested sort the read happens directly under the lock;
    /// otherwise the board is cloned under the lock and re-sorted after the
    /// lock is dropped, so one expensive sort cannot stall other clients.
    async fn collect_entries(
        &self,
        level: LevelId,
        count: i32,
        start_index: i32,
        sort_method: SortMethod,
    ) -> Vec<PlayerEntry> {
        {
            let store = self.leaderboards.read().await;
            let board = store.board(level);
            if board.sort_method() == sort_method {
                return board.get_entries(count, start_index);
            }
        }

        let mut snapshot = {
            let store = self.leaderboards.read().await;
            store.board(level).clone()
        };
        snapshot.set_sort_method(sort_method);
        snapshot.get_entries(count, start_index)
    }

    async fn shutdown(&mut self) {
        // Stop accepting before tearing sessions down so no new connection
        // lands in the cleared table.
        if let Some(tx) = self.accept_shutdown_tx.take() {
            let _ = tx.send(());
        }

        let mut sessions = self.sessions.write().await;
        sessions.broadcast(commands::USER_DISCONNECTED, &[]).await;
        sessions.clear();
    }
}

/// Spawns the receive loop for one connection. The loop exits when the
/// remote closes the stream or the session's write half is dropped; it never
/// decides on its own that the session is dead, it just reports the close.
fn spawn_receive_loop(
    addr: String,
    mut reader: OwnedReadHalf,
    registry: Arc<CommandRegistry>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    tokio::spawn(async move {
        loop {
            match framing::read_frame(&mut reader).await {
                Ok(frame) => registry.dispatch(&addr, &frame.command, &frame.payload),
                Err(e) => {
                    if e.kind() != std::io::ErrorKind::UnexpectedEof {
                        warn!("{} : connection error: {}", addr, e);
                    }
                    break;
                }
            }
        }

        let _ = server_tx.send(ServerMessage::SessionClosed { addr });
    });
}

/// Builds the server's command table. Handlers decode on the receive task
/// and forward typed messages; malformed payloads are logged and dropped
/// without touching the connection.
fn build_registry(server_tx: mpsc::UnboundedSender<ServerMessage>) -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    let tx = server_tx.clone();
    registry.register(
        commands::USER_CONNECTED,
        Box::new(move |addr, _payload| {
            let _ = tx.send(ServerMessage::Connected {
                addr: addr.to_string(),
            });
        }),
    );

    let tx = server_tx.clone();
    registry.register(
        commands::USER_DISCONNECTED,
        Box::new(move |addr, _payload| {
            let _ = tx.send(ServerMessage::Disconnected {
                addr: addr.to_string(),
            });
        }),
    );

    let tx = server_tx.clone();
    registry.register(
        commands::WRITE_TO_LEADERBOARD,
        Box::new(move |addr, payload| match codec::decode_level_entry(payload) {
            Ok((level, entry)) => {
                let _ = tx.send(ServerMessage::WriteEntry {
                    addr: addr.to_string(),
                    level,
                    entry,
                });
            }
            Err(e) => warn!("{} : malformed WriteToLeaderboard payload: {}", addr, e),
        }),
    );

    let tx = server_tx;
    registry.register(
        commands::SEND_LEADERBOARD,
        Box::new(
            move |addr, payload| match codec::decode_leaderboard_request(payload) {
                Ok((level, count, start_index, sort_method)) => {
                    let _ = tx.send(ServerMessage::LeaderboardRequest {
                        addr: addr.to_string(),
                        level,
                        count,
                        start_index,
                        sort_method,
                    });
                }
                Err(e) => warn!("{} : malformed SendLeaderboard payload: {}", addr, e),
            },
        ),
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: i32) -> PlayerEntry {
        PlayerEntry {
            player_name: name.to_string(),
            score,
            accuracy: 60.0,
            longest_streak: 1,
            number_of_tricks: 0,
            number_of_combos: 0,
            shots_fired: 5,
            shots_hit: 3,
            completion_time: 30.0,
        }
    }

    #[test]
    fn registry_translates_write_command() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let registry = build_registry(tx);

        let payload = codec::encode_level_entry(LevelId::Beginner, &entry("alice", 500)).unwrap();
        registry.dispatch("127.0.0.1:9000", commands::WRITE_TO_LEADERBOARD, &payload);

        match rx.try_recv().unwrap() {
            ServerMessage::WriteEntry { addr, level, entry } => {
                assert_eq!(addr, "127.0.0.1:9000");
                assert_eq!(level, LevelId::Beginner);
                assert_eq!(entry.score, 500);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn registry_translates_leaderboard_request() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let registry = build_registry(tx);

        let payload = codec::encode_leaderboard_request(
            LevelId::Practice,
            10,
            2,
            SortMethod::LowestScore,
        )
        .unwrap();
        registry.dispatch("peer", commands::SEND_LEADERBOARD, &payload);

        match rx.try_recv().unwrap() {
            ServerMessage::LeaderboardRequest {
                level,
                count,
                start_index,
                sort_method,
                ..
            } => {
                assert_eq!(level, LevelId::Practice);
                assert_eq!(count, 10);
                assert_eq!(start_index, 2);
                assert_eq!(sort_method, SortMethod::LowestScore);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn malformed_payload_is_dropped_not_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let registry = build_registry(tx);

        registry.dispatch("peer", commands::WRITE_TO_LEADERBOARD, &[1, 2, 3]);
        registry.dispatch("peer", commands::SEND_LEADERBOARD, &[0xFF; 4]);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn connect_and_disconnect_commands_forward_peer_address() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let registry = build_registry(tx);

        registry.dispatch("1.2.3.4:5", commands::USER_CONNECTED, &[]);
        registry.dispatch("1.2.3.4:5", commands::USER_DISCONNECTED, &[]);

        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::Connected { addr } if addr == "1.2.3.4:5"
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::Disconnected { addr } if addr == "1.2.3.4:5"
        ));
    }

    #[tokio::test]
    async fn bind_reports_local_addr() {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::bind("127.0.0.1:0", dir.path()).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
    }
}
