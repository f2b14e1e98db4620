//! # Leaderboard Client Library
//!
//! Client-side implementation of the online leaderboard protocol. The
//! embedding game drives connect/disconnect at times of its choosing,
//! submits finished runs as leaderboard entries, and pulls replies and
//! status out of the client when it wants to display them.
//!
//! ## Design
//!
//! The client never calls back into presentation code. Everything it has to
//! report (connection status changes, log lines, chat messages, errors)
//! goes into a typed event queue the caller drains, and leaderboard replies
//! land in a per-level holding area that is read destructively: one
//! request, one reply, one read.
//!
//! All send operations are silent no-ops while disconnected, so game code
//! can fire them without guarding every call site.
//!
//! ## Module Organization
//!
//! - [`network`]: the connection, the background receive task and the
//!   intent-level send API.
//! - [`events`]: the typed event records handed to the caller.

pub mod events;
pub mod network;

pub use events::ClientEvent;
pub use network::Client;
