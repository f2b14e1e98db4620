//! Command framing over a TCP stream.
//!
//! One frame is a `u16` little-endian command-name length, the UTF-8 name
//! bytes, then exactly [`ARGUMENT_PACKET_SIZE`] payload bytes. Payloads
//! shorter than the packet size are zero-padded, longer ones truncated, so
//! every frame on the wire has a fixed body size for a given name.

use crate::ARGUMENT_PACKET_SIZE;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Sanity cap on command-name length. A length above this means the stream
/// is desynchronized or the peer is hostile; the connection is dropped.
pub const MAX_COMMAND_NAME_LEN: usize = 128;

/// One complete command message as transmitted over the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFrame {
    pub command: String,
    /// Always exactly [`ARGUMENT_PACKET_SIZE`] bytes.
    pub payload: Vec<u8>,
}

impl CommandFrame {
    /// Builds a frame, padding or truncating `payload` to the fixed size.
    pub fn new(command: &str, payload: &[u8]) -> Self {
        Self {
            command: command.to_string(),
            payload: pad_payload(payload),
        }
    }
}

fn pad_payload(payload: &[u8]) -> Vec<u8> {
    let mut padded = vec![0u8; ARGUMENT_PACKET_SIZE];
    let len = payload.len().min(ARGUMENT_PACKET_SIZE);
    padded[..len].copy_from_slice(&payload[..len]);
    padded
}

/// Reads one frame, blocking until a full frame has arrived. EOF before the
/// first byte surfaces as `UnexpectedEof`, which callers treat as a normal
/// remote close.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<CommandFrame> {
    let name_len = reader.read_u16_le().await? as usize;
    if name_len > MAX_COMMAND_NAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("command name length {name_len} exceeds cap {MAX_COMMAND_NAME_LEN}"),
        ));
    }

    let mut name = vec![0u8; name_len];
    reader.read_exact(&mut name).await?;
    let command =
        String::from_utf8(name).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut payload = vec![0u8; ARGUMENT_PACKET_SIZE];
    reader.read_exact(&mut payload).await?;

    Ok(CommandFrame { command, payload })
}

/// Writes one frame and flushes it. The payload is padded or truncated to
/// the fixed packet size before it hits the wire.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    command: &str,
    payload: &[u8],
) -> io::Result<()> {
    let name = command.as_bytes();
    if name.len() > MAX_COMMAND_NAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("command name '{command}' exceeds {MAX_COMMAND_NAME_LEN} bytes"),
        ));
    }

    writer.write_u16_le(name.len() as u16).await?;
    writer.write_all(name).await?;
    writer.write_all(&pad_payload(payload)).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_roundtrip() {
        let (mut a, mut b) = tokio::io::duplex(4096);

        write_frame(&mut a, "SendLeaderboard", b"hello").await.unwrap();
        let frame = read_frame(&mut b).await.unwrap();

        assert_eq!(frame.command, "SendLeaderboard");
        assert_eq!(frame.payload.len(), ARGUMENT_PACKET_SIZE);
        assert_eq!(&frame.payload[..5], b"hello");
        assert!(frame.payload[5..].iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn empty_payload_is_all_zeroes() {
        let (mut a, mut b) = tokio::io::duplex(4096);

        write_frame(&mut a, "UserConnected", &[]).await.unwrap();
        let frame = read_frame(&mut b).await.unwrap();

        assert_eq!(frame.command, "UserConnected");
        assert!(frame.payload.iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn oversize_payload_is_truncated() {
        let (mut a, mut b) = tokio::io::duplex(8192);

        let payload = vec![0xABu8; ARGUMENT_PACKET_SIZE + 100];
        write_frame(&mut a, "Message", &payload).await.unwrap();
        let frame = read_frame(&mut b).await.unwrap();

        assert_eq!(frame.payload.len(), ARGUMENT_PACKET_SIZE);
        assert!(frame.payload.iter().all(|&b| b == 0xAB));
    }

    #[tokio::test]
    async fn multiple_frames_in_sequence() {
        let (mut a, mut b) = tokio::io::duplex(8192);

        write_frame(&mut a, "First", b"one").await.unwrap();
        write_frame(&mut a, "Second", b"two").await.unwrap();

        let first = read_frame(&mut b).await.unwrap();
        let second = read_frame(&mut b).await.unwrap();
        assert_eq!(first.command, "First");
        assert_eq!(second.command, "Second");
        assert_eq!(&second.payload[..3], b"two");
    }

    #[tokio::test]
    async fn oversize_name_length_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(4096);

        a.write_u16_le(60_000).await.unwrap();
        let err = read_frame(&mut b).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn invalid_utf8_name_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(4096);

        a.write_u16_le(2).await.unwrap();
        a.write_all(&[0xFF, 0xFE]).await.unwrap();
        a.write_all(&[0u8; ARGUMENT_PACKET_SIZE]).await.unwrap();

        let err = read_frame(&mut b).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn eof_mid_frame_is_unexpected_eof() {
        let (mut a, mut b) = tokio::io::duplex(4096);

        a.write_u16_le(5).await.unwrap();
        a.write_all(b"Hel").await.unwrap();
        drop(a);

        let err = read_frame(&mut b).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn oversize_command_name_refused_on_write() {
        let (mut a, _b) = tokio::io::duplex(4096);

        let long_name = "x".repeat(MAX_COMMAND_NAME_LEN + 1);
        let err = write_frame(&mut a, &long_name, &[]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
