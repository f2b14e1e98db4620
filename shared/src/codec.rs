//! Deterministic binary encoding of the values each command carries.
//!
//! All payloads are bincode with fixed-width little-endian integers, encoded
//! field by field in declaration order. This is a structural codec: both
//! peers agree on the layout by construction, with no runtime type identity
//! to resolve. Level and sort-method ordinals travel as `i32` so an
//! out-of-range value decodes to an error instead of a bogus enum value.

use crate::entry::{LevelId, PlayerEntry, SortMethod};
use crate::ARGUMENT_PACKET_SIZE;
use std::io::Cursor;

pub type CodecResult<T> = Result<T, bincode::Error>;

fn level_from_wire(ordinal: i32) -> CodecResult<LevelId> {
    LevelId::from_i32(ordinal)
        .ok_or_else(|| bincode::ErrorKind::Custom(format!("unknown level ordinal {ordinal}")).into())
}

fn sort_method_from_wire(ordinal: i32) -> CodecResult<SortMethod> {
    SortMethod::from_i32(ordinal).ok_or_else(|| {
        bincode::ErrorKind::Custom(format!("unknown sort method ordinal {ordinal}")).into()
    })
}

pub fn encode_entry(entry: &PlayerEntry) -> CodecResult<Vec<u8>> {
    bincode::serialize(entry)
}

pub fn decode_entry(bytes: &[u8]) -> CodecResult<PlayerEntry> {
    bincode::deserialize(bytes)
}

/// Level ordinal first, then the entry. Order matters for decode.
pub fn encode_level_entry(level: LevelId, entry: &PlayerEntry) -> CodecResult<Vec<u8>> {
    bincode::serialize(&(level.as_i32(), entry))
}

pub fn decode_level_entry(bytes: &[u8]) -> CodecResult<(LevelId, PlayerEntry)> {
    let mut cursor = Cursor::new(bytes);
    let ordinal: i32 = bincode::deserialize_from(&mut cursor)?;
    let level = level_from_wire(ordinal)?;
    let entry: PlayerEntry = bincode::deserialize_from(&mut cursor)?;
    Ok((level, entry))
}

/// Encodes a leaderboard reply: level, the requested count (not the number
/// of entries supplied), then `requested_count` records. Missing entries are
/// padded with zero-valued ones so the reply always describes exactly
/// `requested_count` slots; encoding stops silently once the next record
/// would push the buffer past [`ARGUMENT_PACKET_SIZE`].
pub fn encode_entry_list(
    level: LevelId,
    requested_count: i32,
    entries: &[PlayerEntry],
) -> CodecResult<Vec<u8>> {
    let mut buffer = bincode::serialize(&(level.as_i32(), requested_count))?;
    let padding = PlayerEntry::default();

    for slot in 0..requested_count.max(0) as usize {
        let entry = entries.get(slot).unwrap_or(&padding);
        let record = bincode::serialize(entry)?;
        if buffer.len() + record.len() > ARGUMENT_PACKET_SIZE {
            break;
        }
        buffer.extend_from_slice(&record);
    }

    Ok(buffer)
}

/// Decodes a leaderboard reply. Reads up to the requested count of records;
/// stops early without error when the buffer runs out (the encode side
/// truncated at the packet cap). Note that the frame's zero-padding decodes
/// as zero-valued entries, which is exactly what padding slots contain.
pub fn decode_entry_list(bytes: &[u8]) -> CodecResult<(LevelId, Vec<PlayerEntry>)> {
    let mut cursor = Cursor::new(bytes);
    let (ordinal, count): (i32, i32) = bincode::deserialize_from(&mut cursor)?;
    let level = level_from_wire(ordinal)?;

    let mut entries = Vec::new();
    for _ in 0..count.max(0) {
        match bincode::deserialize_from::<_, PlayerEntry>(&mut cursor) {
            Ok(entry) => entries.push(entry),
            Err(err) => match *err {
                bincode::ErrorKind::Io(ref io)
                    if io.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                _ => return Err(err),
            },
        }
    }

    Ok((level, entries))
}

/// Four `i32` fields in fixed order: level, count, start index, sort method.
pub fn encode_leaderboard_request(
    level: LevelId,
    count: i32,
    start_index: i32,
    sort_method: SortMethod,
) -> CodecResult<Vec<u8>> {
    bincode::serialize(&(level.as_i32(), count, start_index, sort_method.as_i32()))
}

pub fn decode_leaderboard_request(bytes: &[u8]) -> CodecResult<(LevelId, i32, i32, SortMethod)> {
    let (level, count, start_index, sort_method): (i32, i32, i32, i32) =
        bincode::deserialize(bytes)?;
    Ok((
        level_from_wire(level)?,
        count,
        start_index,
        sort_method_from_wire(sort_method)?,
    ))
}

/// Chat-style text carried by the `Message` command.
pub fn encode_message(text: &str) -> CodecResult<Vec<u8>> {
    bincode::serialize(text)
}

pub fn decode_message(bytes: &[u8]) -> CodecResult<String> {
    bincode::deserialize(bytes)
}
