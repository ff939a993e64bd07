//! Field-mask encoding driven by a [`FieldTable`].
//!
//! Full and delta messages share one shape: a 4-byte mask followed by the
//! value of every set field in ascending bit order. Both are produced from
//! the same table, so they cannot disagree on layout.

use crate::debug;
use crate::error::Result;
use crate::mask::Mask;
use crate::schema::{FieldAccess, FieldIndex, FieldTable};
use crate::snapshot::ReplicatedState;
use crate::stream::{ByteReader, ByteWriter};
use bytes::Bytes;

/// Largest float difference still treated as unchanged.
pub const FLOAT_TOLERANCE: f32 = 0.001;

/// Result of handling one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    /// Values matched, nothing written, bit left clear.
    Unchanged,
    /// Value encoded and bit set.
    Written,
    /// Value decoded into the target state.
    Applied,
    /// No field registered at this index; nothing read or written.
    Unknown,
}

impl FieldOutcome {
    /// `true` when no bytes were produced for the field.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldOutcome::Unchanged | FieldOutcome::Unknown)
    }
}

/// Tolerance check in single precision. The difference is taken between the
/// two rounded `f32` values, so a nominal 0.001 step can land on either side
/// of the boundary depending on magnitude: `1.0 -> 1.001` counts as changed,
/// `100.0 -> 100.001` as unchanged.
pub fn floats_equal(old: f32, new: f32) -> bool {
    (old - new).abs() <= FLOAT_TOLERANCE
}

/// Length first, then content.
pub fn bytes_equal(old: &[u8], new: &[u8]) -> bool {
    if old.len() != new.len() {
        return false;
    }
    old.iter().zip(new).all(|(a, b)| a == b)
}

/// Writes one field unconditionally and marks its bit.
pub fn write_base_value<S>(
    table: &FieldTable<S>,
    state: &S,
    index: FieldIndex,
    mask: &mut Mask,
    out: &mut ByteWriter,
) -> Result<FieldOutcome> {
    let Some(field) = table.get(index) else {
        log::warn!("write base value failed: no field at index {}", index);
        return Ok(FieldOutcome::Unknown);
    };

    match field.access {
        FieldAccess::Float32 { get, .. } => out.write_f32(get(state)),
        FieldAccess::Raw64 { get, .. } => out.write_u64(get(state)),
        FieldAccess::Bytes { get, .. } => out.write_bytes(get(state))?,
    }

    mask.set(index)?;
    Ok(FieldOutcome::Written)
}

/// Compares one field between `old` and `new`; writes the new value and marks
/// its bit only when they differ.
pub fn compare_and_write_delta<S>(
    table: &FieldTable<S>,
    old: &S,
    new: &S,
    index: FieldIndex,
    mask: &mut Mask,
    out: &mut ByteWriter,
) -> Result<FieldOutcome> {
    let Some(field) = table.get(index) else {
        log::debug!("delta compare skipped: no field at index {}", index);
        return Ok(FieldOutcome::Unknown);
    };

    match field.access {
        FieldAccess::Float32 { get, .. } => {
            let value = get(new);
            if floats_equal(get(old), value) {
                return Ok(FieldOutcome::Unchanged);
            }
            out.write_f32(value);
        }
        FieldAccess::Raw64 { get, .. } => {
            let value = get(new);
            if get(old) == value {
                return Ok(FieldOutcome::Unchanged);
            }
            out.write_u64(value);
        }
        FieldAccess::Bytes { get, .. } => {
            let value = get(new);
            if bytes_equal(get(old), value) {
                return Ok(FieldOutcome::Unchanged);
            }
            out.write_bytes(value)?;
        }
    }

    mask.set(index)?;
    Ok(FieldOutcome::Written)
}

/// Reads one field from `input` into `state`.
pub fn set_base_value<S>(
    table: &FieldTable<S>,
    state: &mut S,
    index: FieldIndex,
    input: &mut ByteReader<'_>,
) -> Result<FieldOutcome> {
    let Some(field) = table.get(index) else {
        log::warn!("set base value failed: no field at index {}", index);
        return Ok(FieldOutcome::Unknown);
    };

    match field.access {
        FieldAccess::Float32 { set, .. } => set(state, input.read_f32()?),
        FieldAccess::Raw64 { set, .. } => set(state, input.read_u64()?),
        FieldAccess::Bytes { set, .. } => set(state, input.read_bytes()?),
    }

    Ok(FieldOutcome::Applied)
}

/// Encodes every registered field: the message sent on first contact.
pub fn encode_full<S>(table: &FieldTable<S>, state: &S) -> Result<Bytes> {
    let mut mask = Mask::new();
    let mut payload = ByteWriter::new();

    for field in table.iter() {
        write_base_value(table, state, field.index, &mut mask, &mut payload)?;
    }

    debug::trace_full(table, mask, payload.len());
    Ok(frame(mask, payload))
}

/// Encodes the fields of `new` that differ from `old`. The flag is `true`
/// when at least one field was written.
pub fn encode_delta<S>(table: &FieldTable<S>, old: &S, new: &S) -> Result<(Bytes, bool)> {
    let mut mask = Mask::new();
    let mut payload = ByteWriter::new();

    for field in table.iter() {
        compare_and_write_delta(table, old, new, field.index, &mut mask, &mut payload)?;
    }

    debug::trace_delta(table, mask, payload.len());
    Ok((frame(mask, payload), !mask.is_empty()))
}

fn frame(mask: Mask, payload: ByteWriter) -> Bytes {
    let mut out = ByteWriter::with_capacity(4 + payload.len());
    out.write_u32(mask.bits());
    out.write_raw(payload.as_slice());
    out.finish()
}

/// Applies a `[mask][payload]` message and returns the mask it carried.
pub fn combine<S: ReplicatedState>(table: &FieldTable<S>, state: &mut S, data: &[u8]) -> Result<Mask> {
    let mut input = ByteReader::new(data);
    let mask = Mask::from_bits(input.read_u32()?);
    combine_masked(table, state, mask, input.rest())?;
    Ok(mask)
}

/// Applies `payload` under an externally supplied mask. Fields whose bit is
/// clear keep their value; bits without a registered field are skipped.
pub fn combine_masked<S: ReplicatedState>(
    table: &FieldTable<S>,
    state: &mut S,
    mask: Mask,
    payload: &[u8],
) -> Result<()> {
    let mut input = ByteReader::new(payload);
    let mut applied = 0;
    let mut result = Ok(());

    for index in mask.iter() {
        match set_base_value(table, state, index, &mut input) {
            Ok(FieldOutcome::Applied) => applied += 1,
            Ok(_) => {}
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    // Fields read before a short payload stay applied, so the flag must
    // follow them even on error.
    if applied > 0 {
        state.snapshot_mut().set_dirty(true);
    }
    result?;

    if input.remaining() > 0 {
        log::debug!("combine left {} trailing bytes", input.remaining());
    }

    debug::trace_combine(table, mask, payload.len());
    debug::log_snapshot("combined", state.snapshot());
    Ok(())
}
