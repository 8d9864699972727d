//! Wire-level MessagePack primitives: shortest-encoding writers for each
//! tag family, plus big-endian read helpers for the decoder.
//!
//! Every multi-byte quantity on the wire is big-endian regardless of host
//! byte order; `to_be_bytes`/`from_be_bytes` are the normalization point.

use cmsgpack_buffers::{BufferError, GrowableBuffer};

pub fn write_nil(buf: &mut GrowableBuffer<'_>) -> Result<(), BufferError> {
    buf.append(&[0xc0])
}

pub fn write_bool(buf: &mut GrowableBuffer<'_>, b: bool) -> Result<(), BufferError> {
    buf.append(&[if b { 0xc3 } else { 0xc2 }])
}

/// Writes an integer using the smallest tag that fits.
///
/// Nonnegative ladder: fixint → uint8 → uint16 → uint32 → uint64.
/// Negative ladder: negative fixint → int8 → int16 → int32 → int64.
pub fn write_int(buf: &mut GrowableBuffer<'_>, n: i64) -> Result<(), BufferError> {
    let mut b = [0u8; 9];
    let enclen;
    if n >= 0 {
        if n <= 127 {
            b[0] = n as u8; // positive fixint
            enclen = 1;
        } else if n <= 0xff {
            b[0] = 0xcc; // uint 8
            b[1] = n as u8;
            enclen = 2;
        } else if n <= 0xffff {
            b[0] = 0xcd; // uint 16
            b[1..3].copy_from_slice(&(n as u16).to_be_bytes());
            enclen = 3;
        } else if n <= 0xffff_ffff {
            b[0] = 0xce; // uint 32
            b[1..5].copy_from_slice(&(n as u32).to_be_bytes());
            enclen = 5;
        } else {
            b[0] = 0xcf; // uint 64
            b[1..9].copy_from_slice(&(n as u64).to_be_bytes());
            enclen = 9;
        }
    } else if n >= -32 {
        b[0] = n as u8; // negative fixint
        enclen = 1;
    } else if n >= -128 {
        b[0] = 0xd0; // int 8
        b[1] = n as u8;
        enclen = 2;
    } else if n >= -32768 {
        b[0] = 0xd1; // int 16
        b[1..3].copy_from_slice(&(n as i16).to_be_bytes());
        enclen = 3;
    } else if n >= -2_147_483_648 {
        b[0] = 0xd2; // int 32
        b[1..5].copy_from_slice(&(n as i32).to_be_bytes());
        enclen = 5;
    } else {
        b[0] = 0xd3; // int 64
        b[1..9].copy_from_slice(&n.to_be_bytes());
        enclen = 9;
    }
    buf.append(&b[..enclen])
}

/// Writes a float, narrowing to the 4-byte `float32` form when the value
/// survives the round trip exactly, and the 8-byte `float64` form otherwise.
pub fn write_float(buf: &mut GrowableBuffer<'_>, d: f64) -> Result<(), BufferError> {
    let f = d as f32;
    if f as f64 == d {
        let mut b = [0u8; 5];
        b[0] = 0xca;
        b[1..5].copy_from_slice(&f.to_be_bytes());
        buf.append(&b)
    } else {
        let mut b = [0u8; 9];
        b[0] = 0xcb;
        b[1..9].copy_from_slice(&d.to_be_bytes());
        buf.append(&b)
    }
}

/// Writes a raw/string payload: fixraw (len < 32) → raw16 → raw32. The
/// bytes are emitted literally, with no conversion or escaping.
pub fn write_raw(buf: &mut GrowableBuffer<'_>, s: &[u8]) -> Result<(), BufferError> {
    let len = s.len();
    let mut hdr = [0u8; 5];
    let hdrlen;
    if len < 32 {
        hdr[0] = 0xa0 | len as u8; // fix raw
        hdrlen = 1;
    } else if len <= 0xffff {
        hdr[0] = 0xda; // raw 16
        hdr[1..3].copy_from_slice(&(len as u16).to_be_bytes());
        hdrlen = 3;
    } else {
        hdr[0] = 0xdb; // raw 32
        hdr[1..5].copy_from_slice(&(len as u32).to_be_bytes());
        hdrlen = 5;
    }
    buf.append(&hdr[..hdrlen])?;
    buf.append(s)
}

/// Writes an opaque binary payload: bin8 (len < 255) → bin16 (len < 65535)
/// → bin32 (len < 4294967295).
///
/// Payloads at or above 2^32 - 1 bytes have no representable header in this
/// tag set and degrade to `nil`. The stream stays well formed but the
/// payload is lost; callers serializing blobs that large must pre-check.
pub fn write_bin(buf: &mut GrowableBuffer<'_>, s: &[u8]) -> Result<(), BufferError> {
    let len = s.len() as u64;
    let mut hdr = [0u8; 5];
    let hdrlen;
    if len < 255 {
        hdr[0] = 0xc4; // bin 8
        hdr[1] = len as u8;
        hdrlen = 2;
    } else if len < 65535 {
        hdr[0] = 0xc5; // bin 16
        hdr[1..3].copy_from_slice(&(len as u16).to_be_bytes());
        hdrlen = 3;
    } else if len < 4_294_967_295 {
        hdr[0] = 0xc6; // bin 32
        hdr[1..5].copy_from_slice(&(len as u32).to_be_bytes());
        hdrlen = 5;
    } else {
        return write_nil(buf);
    }
    buf.append(&hdr[..hdrlen])?;
    buf.append(s)
}

/// Writes an array header: fixarray (n <= 15) → array16 → array32.
pub fn write_array_header(buf: &mut GrowableBuffer<'_>, n: usize) -> Result<(), BufferError> {
    let mut hdr = [0u8; 5];
    let hdrlen;
    if n <= 15 {
        hdr[0] = 0x90 | n as u8;
        hdrlen = 1;
    } else if n <= 65535 {
        hdr[0] = 0xdc;
        hdr[1..3].copy_from_slice(&(n as u16).to_be_bytes());
        hdrlen = 3;
    } else {
        hdr[0] = 0xdd;
        hdr[1..5].copy_from_slice(&(n as u32).to_be_bytes());
        hdrlen = 5;
    }
    buf.append(&hdr[..hdrlen])
}

/// Writes a map header: fixmap (n <= 15) → map16 → map32.
pub fn write_map_header(buf: &mut GrowableBuffer<'_>, n: usize) -> Result<(), BufferError> {
    let mut hdr = [0u8; 5];
    let hdrlen;
    if n <= 15 {
        hdr[0] = 0x80 | n as u8;
        hdrlen = 1;
    } else if n <= 65535 {
        hdr[0] = 0xde;
        hdr[1..3].copy_from_slice(&(n as u16).to_be_bytes());
        hdrlen = 3;
    } else {
        hdr[0] = 0xdf;
        hdr[1..5].copy_from_slice(&(n as u32).to_be_bytes());
        hdrlen = 5;
    }
    buf.append(&hdr[..hdrlen])
}

#[inline]
pub(crate) fn be16(b: &[u8]) -> u16 {
    u16::from_be_bytes([b[0], b[1]])
}

#[inline]
pub(crate) fn be32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

#[inline]
pub(crate) fn be64(b: &[u8]) -> u64 {
    u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}
