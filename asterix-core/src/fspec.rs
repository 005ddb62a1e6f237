//! The FSPEC primitive: a chain of octets whose low bit (FX) signals
//! continuation, and whose remaining seven bits each flag whether one slot
//! in an ordered list is present.
//!
//! This single primitive backs both the record-level FSPEC (spec §4.2,
//! slots = FRNs of the active UAP) and a `Compound` item's primary mask
//! (spec §4.3, slots = secondaries) — in real ASTERIX a Compound's primary
//! mask *is* a miniature FSPEC, so the two are modeled with one function
//! rather than duplicated.

use crate::bits::ByteCursor;
use crate::error::TruncationError;

/// Reads a chained FSPEC-style bitmap and returns the 1-based positions that
/// were set, in ascending order.
///
/// For octet index `k` (0-based), bit 8 (MSB) of that octet is position
/// `k*7 + 1`, bit 7 is position `k*7 + 2`, ... bit 2 is position `k*7 + 7`;
/// bit 1 (LSB) is FX: if set, another octet follows.
///
/// An all-zero single octet (no FX, no bits set) is valid and yields an
/// empty list (spec §4.2 edge case). Running out of buffer while FX is
/// still set is a [`TruncationError`].
pub fn read_presence_bits(cursor: &mut ByteCursor<'_>) -> Result<Vec<u32>, TruncationError> {
    let mut positions = Vec::new();
    let mut octet_index: u32 = 0;
    loop {
        let octet = cursor.read_u8()?;
        for local in 1..=7u32 {
            let mask = 0x80u8 >> (local - 1);
            if octet & mask != 0 {
                positions.push(octet_index * 7 + local);
            }
        }
        if octet & 0x01 == 0 {
            break;
        }
        octet_index += 1;
    }
    Ok(positions)
}
