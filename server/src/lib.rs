//! # Leaderboard Server Library
//!
//! Authoritative server for the online leaderboard protocol. It owns the
//! canonical leaderboard for every game level, accepts TCP connections from
//! game clients, and answers leaderboard commands over the shared wire
//! protocol.
//!
//! ## Architecture
//!
//! A single long-lived accept loop registers each connection in the session
//! table and spawns a dedicated receive task for it. Receive tasks decode
//! frames and dispatch them through the shared command registry; the
//! handlers only translate payloads into typed messages on a channel. The
//! main loop consumes that channel, so all leaderboard mutation and all
//! replies are serialized in one place while decoding stays concurrent.
//!
//! ## Module Organization
//!
//! - [`session`]: the session table, one entry per connected client,
//!   keyed by remote address, owning the connection's write half.
//! - [`store`]: the canonical per-level leaderboards and their on-disk
//!   persistence.
//! - [`network`]: the accept loop, receive tasks, command table and the
//!   main server loop.
//!
//! ## Failure containment
//!
//! Network and decode failures are contained per connection: a malformed
//! payload is logged and dropped, a broken stream removes only that
//! client's session. Invalid leaderboard entries are silently discarded so
//! validation rules are not leaked to a potential cheater.

pub mod network;
pub mod session;
pub mod store;
