//! Value tree encoder: variant dispatch, the nesting ceiling, and the
//! array-vs-map classification for generic key-value structures.

use cmsgpack_buffers::GrowableBuffer;

use crate::value::Value;
use crate::wire;
use crate::CodecError;

/// Maximum container nesting depth during encoding.
///
/// Containers at this depth encode as `nil` instead of recursing, so cyclic
/// or pathologically deep trees cannot overflow the stack. The truncation is
/// silent wire behavior, not an error.
pub const MAX_NESTING: usize = 16;

/// Encodes `value` into a fresh byte vector.
pub fn pack(value: &Value) -> Result<Vec<u8>, CodecError> {
    let mut buf = GrowableBuffer::new();
    write_value(&mut buf, value, 0)?;
    Ok(buf.to_vec())
}

/// Encodes `value` into a caller-supplied buffer.
///
/// This is the pooled-memory entry point: construct the buffer with
/// [`GrowableBuffer::with_allocator`] and retrieve the storage through
/// [`GrowableBuffer::raw_parts`] afterwards.
pub fn pack_into(value: &Value, buf: &mut GrowableBuffer<'_>) -> Result<(), CodecError> {
    write_value(buf, value, 0)
}

fn write_value(
    buf: &mut GrowableBuffer<'_>,
    value: &Value,
    level: usize,
) -> Result<(), CodecError> {
    if level == MAX_NESTING {
        if let Value::Array(_) | Value::Map(_) = value {
            return Ok(wire::write_nil(buf)?);
        }
    }
    match value {
        Value::Nil => wire::write_nil(buf)?,
        Value::Bool(b) => wire::write_bool(buf, *b)?,
        Value::Int(n) => wire::write_int(buf, *n)?,
        Value::Float(d) => wire::write_float(buf, *d)?,
        Value::Bytes(s) => wire::write_raw(buf, s)?,
        Value::Blob(blob) => {
            // A zero-length payload means the blob carries nothing to pack.
            if blob.is_empty() {
                wire::write_nil(buf)?;
            } else {
                wire::write_bin(buf, blob.as_slice())?;
            }
        }
        Value::Array(items) => {
            wire::write_array_header(buf, items.len())?;
            for item in items {
                write_value(buf, item, level + 1)?;
            }
        }
        Value::Map(pairs) => write_table(buf, pairs, level)?,
    }
    Ok(())
}

/// Encodes a generic key-value structure, deciding between the array and
/// map wire shapes.
fn write_table(
    buf: &mut GrowableBuffer<'_>,
    pairs: &[(Value, Value)],
    level: usize,
) -> Result<(), CodecError> {
    match table_as_array(pairs) {
        Some(items) => {
            // Escape hatch for raw memory crossing the value boundary: a
            // 2-entry array-shaped table {1: blob, 2: length} encodes as a
            // binary payload instead of an array.
            if items.len() == 2 {
                if let (Value::Blob(blob), Value::Int(declared)) = (items[0], items[1]) {
                    let n = (*declared).clamp(0, blob.len() as i64) as usize;
                    return Ok(wire::write_bin(buf, &blob.as_slice()[..n])?);
                }
            }
            wire::write_array_header(buf, items.len())?;
            for item in items {
                write_value(buf, item, level + 1)?;
            }
        }
        None => {
            wire::write_map_header(buf, pairs.len())?;
            for (key, val) in pairs {
                write_value(buf, key, level + 1)?;
                write_value(buf, val, level + 1)?;
            }
        }
    }
    Ok(())
}

/// Classifies a generic structure as an array when its keys are exactly the
/// integers `1..=count`, returning the values in index order.
///
/// One scan tracks the entry count and the largest integer key seen, bailing
/// out on any non-integral or non-positive key. With unique keys,
/// `max_index == count` alone then guarantees every index from 1 to count is
/// present: a gap would push the maximum above the count. Duplicate keys,
/// which a pair list can carry, are caught afterwards by the slot
/// occupancy check.
fn table_as_array(pairs: &[(Value, Value)]) -> Option<Vec<&Value>> {
    let mut count: i64 = 0;
    let mut max_index: i64 = 0;
    let mut entries: Vec<(usize, &Value)> = Vec::with_capacity(pairs.len());
    for (key, val) in pairs {
        let idx = int_key(key)?;
        if idx < 1 {
            return None;
        }
        count += 1;
        if idx > max_index {
            max_index = idx;
        }
        entries.push((idx as usize - 1, val));
    }
    if max_index != count {
        return None;
    }
    let mut slots: Vec<Option<&Value>> = vec![None; entries.len()];
    for (slot, val) in entries {
        if slots[slot].is_some() {
            return None;
        }
        slots[slot] = Some(val);
    }
    Some(slots.into_iter().flatten().collect())
}

/// Integer view of a map key: `Int` directly, `Float` only when equal to
/// its own truncation.
fn int_key(key: &Value) -> Option<i64> {
    match key {
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.is_finite() && f.floor() == *f => Some(*f as i64),
        _ => None,
    }
}
