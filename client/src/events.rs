//! Typed events the client records for the embedding caller.
//!
//! The protocol core never calls back into presentation code; it appends
//! events to an in-memory list that the caller drains at its own pace.

/// One queryable event record.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The connection went up or down.
    ConnectionStatus { connected: bool },
    /// Informational log line.
    Log { message: String },
    /// Chat-style text received from the server.
    Message { text: String },
    /// A failure the caller may want to surface.
    Error { message: String },
}
