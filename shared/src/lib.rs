pub mod codec;
pub mod commands;
pub mod entry;
pub mod framing;
pub mod leaderboard;

pub use commands::CommandRegistry;
pub use entry::{LevelId, PlayerEntry, SortMethod};
pub use framing::CommandFrame;
pub use leaderboard::Leaderboard;

/// Fixed size of every command payload on the wire. Frames always carry
/// exactly this many payload bytes; shorter payloads are zero-padded and
/// longer ones are truncated. Both peers must be built with the same value
/// (it is not negotiated), and it caps how many entries fit in one
/// `SendLeaderboard` reply: 25 zero-named records after the list header,
/// fewer as player names grow.
pub const ARGUMENT_PACKET_SIZE: usize = 1024;

/// Default TCP port for the leaderboard server.
pub const DEFAULT_PORT: u16 = 7777;

/// Boxed error type used at async API boundaries. `Send + Sync` so server
/// and client futures can be spawned onto the runtime.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
