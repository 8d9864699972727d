//! MessagePack decoder: tag dispatch on the leading byte, fix-range bitmask
//! classification, and recursive container reconstruction.

use cmsgpack_buffers::Cursor;

use crate::value::{Blob, Value};
use crate::wire::{be16, be32, be64};
use crate::CodecError;

// Wire lengths are attacker-controlled; cap container preallocation.
const PREALLOC_LIMIT: usize = 4096;

// Container recursion guard. The wire format frames nesting at one byte per
// level, so depth is bounded by input size, but a few hundred KB of fixarray
// tags would still exhaust the stack without a ceiling.
const MAX_DECODE_DEPTH: usize = 512;

/// Decodes exactly one value from `input`.
///
/// Leftover bytes after a successful root decode are an error: the wire
/// format requires the input to represent exactly one value, not a prefix
/// of a larger buffer.
pub fn unpack(input: &[u8]) -> Result<Value, CodecError> {
    let mut cur = Cursor::new(input);
    let value = read_value(&mut cur)?;
    if cur.remaining() != 0 {
        return Err(CodecError::TrailingData);
    }
    Ok(value)
}

/// Decodes one value at the cursor position.
pub fn read_value(cur: &mut Cursor<'_>) -> Result<Value, CodecError> {
    read_value_at(cur, 0)
}

fn read_value_at(cur: &mut Cursor<'_>, depth: usize) -> Result<Value, CodecError> {
    cur.require(1)?;
    match cur.peek() {
        0xc0 => {
            cur.consume(1);
            Ok(Value::Nil)
        }
        0xc2 => {
            cur.consume(1);
            Ok(Value::Bool(false))
        }
        0xc3 => {
            cur.consume(1);
            Ok(Value::Bool(true))
        }
        0xcc => {
            // uint 8
            cur.require(2)?;
            let n = cur.rest()[1] as i64;
            cur.consume(2);
            Ok(Value::Int(n))
        }
        0xcd => {
            // uint 16
            cur.require(3)?;
            let n = be16(&cur.rest()[1..]) as i64;
            cur.consume(3);
            Ok(Value::Int(n))
        }
        0xce => {
            // uint 32
            cur.require(5)?;
            let n = be32(&cur.rest()[1..]) as i64;
            cur.consume(5);
            Ok(Value::Int(n))
        }
        0xcf => {
            // uint 64; wraps into the signed value model
            cur.require(9)?;
            let n = be64(&cur.rest()[1..]) as i64;
            cur.consume(9);
            Ok(Value::Int(n))
        }
        0xd0 => {
            // int 8
            cur.require(2)?;
            let n = cur.rest()[1] as i8 as i64;
            cur.consume(2);
            Ok(Value::Int(n))
        }
        0xd1 => {
            // int 16
            cur.require(3)?;
            let n = be16(&cur.rest()[1..]) as i16 as i64;
            cur.consume(3);
            Ok(Value::Int(n))
        }
        0xd2 => {
            // int 32
            cur.require(5)?;
            let n = be32(&cur.rest()[1..]) as i32 as i64;
            cur.consume(5);
            Ok(Value::Int(n))
        }
        0xd3 => {
            // int 64
            cur.require(9)?;
            let n = be64(&cur.rest()[1..]) as i64;
            cur.consume(9);
            Ok(Value::Int(n))
        }
        0xca => {
            // float 32
            cur.require(5)?;
            let f = f32::from_bits(be32(&cur.rest()[1..]));
            cur.consume(5);
            Ok(Value::Float(f as f64))
        }
        0xcb => {
            // float 64
            cur.require(9)?;
            let d = f64::from_bits(be64(&cur.rest()[1..]));
            cur.consume(9);
            Ok(Value::Float(d))
        }
        0xda => {
            // raw 16
            cur.require(3)?;
            let l = be16(&cur.rest()[1..]) as usize;
            cur.require(3 + l)?;
            let bytes = cur.rest()[3..3 + l].to_vec();
            cur.consume(3 + l);
            Ok(Value::Bytes(bytes))
        }
        0xdb => {
            // raw 32
            cur.require(5)?;
            let l = be32(&cur.rest()[1..]) as usize;
            cur.require(5 + l)?;
            let bytes = cur.rest()[5..5 + l].to_vec();
            cur.consume(5 + l);
            Ok(Value::Bytes(bytes))
        }
        0xdc => {
            // array 16
            cur.require(3)?;
            let l = be16(&cur.rest()[1..]) as usize;
            cur.consume(3);
            read_array(cur, l, depth)
        }
        0xdd => {
            // array 32
            cur.require(5)?;
            let l = be32(&cur.rest()[1..]) as usize;
            cur.consume(5);
            read_array(cur, l, depth)
        }
        0xde => {
            // map 16
            cur.require(3)?;
            let l = be16(&cur.rest()[1..]) as usize;
            cur.consume(3);
            read_map(cur, l, depth)
        }
        0xdf => {
            // map 32
            cur.require(5)?;
            let l = be32(&cur.rest()[1..]) as usize;
            cur.consume(5);
            read_map(cur, l, depth)
        }
        0xc4 => {
            // bin 8
            cur.require(2)?;
            let l = cur.rest()[1] as usize;
            cur.require(2 + l)?;
            let blob = Blob::copy_from(&cur.rest()[2..2 + l]);
            cur.consume(2 + l);
            Ok(Value::Blob(blob))
        }
        0xc5 => {
            // bin 16
            cur.require(3)?;
            let l = be16(&cur.rest()[1..]) as usize;
            cur.require(3 + l)?;
            let blob = Blob::copy_from(&cur.rest()[3..3 + l]);
            cur.consume(3 + l);
            Ok(Value::Blob(blob))
        }
        0xc6 => {
            // bin 32
            cur.require(5)?;
            let l = be32(&cur.rest()[1..]) as usize;
            cur.require(5 + l)?;
            let blob = Blob::copy_from(&cur.rest()[5..5 + l]);
            cur.consume(5 + l);
            Ok(Value::Blob(blob))
        }
        byte => {
            // Types not identified by an exact first byte, classified by
            // bit pattern.
            if byte & 0x80 == 0 {
                // positive fixint
                cur.consume(1);
                Ok(Value::Int(byte as i64))
            } else if byte & 0xe0 == 0xe0 {
                // negative fixint, sign-extended
                cur.consume(1);
                Ok(Value::Int(byte as i8 as i64))
            } else if byte & 0xe0 == 0xa0 {
                // fix raw, length in the low 5 bits
                let l = (byte & 0x1f) as usize;
                cur.require(1 + l)?;
                let bytes = cur.rest()[1..1 + l].to_vec();
                cur.consume(1 + l);
                Ok(Value::Bytes(bytes))
            } else if byte & 0xf0 == 0x90 {
                // fix array, count in the low 4 bits
                cur.consume(1);
                read_array(cur, (byte & 0xf) as usize, depth)
            } else if byte & 0xf0 == 0x80 {
                // fix map, count in the low 4 bits
                cur.consume(1);
                read_map(cur, (byte & 0xf) as usize, depth)
            } else {
                Err(cur.bad_format().into())
            }
        }
    }
}

fn read_array(cur: &mut Cursor<'_>, len: usize, depth: usize) -> Result<Value, CodecError> {
    if depth >= MAX_DECODE_DEPTH {
        return Err(cur.bad_format().into());
    }
    let mut items = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    for _ in 0..len {
        items.push(read_value_at(cur, depth + 1)?);
    }
    Ok(Value::Array(items))
}

fn read_map(cur: &mut Cursor<'_>, len: usize, depth: usize) -> Result<Value, CodecError> {
    if depth >= MAX_DECODE_DEPTH {
        return Err(cur.bad_format().into());
    }
    let mut pairs = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    for _ in 0..len {
        let key = read_value_at(cur, depth + 1)?;
        let val = read_value_at(cur, depth + 1)?;
        pairs.push((key, val));
    }
    Ok(Value::Map(pairs))
}
