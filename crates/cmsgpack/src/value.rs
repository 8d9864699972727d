//! [`Value`] — the dynamic value tree both codec halves operate on — and
//! [`Blob`], the externally-lifetime-managed binary payload type.

use std::fmt;
use std::ptr::NonNull;
use std::slice;
use std::str;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Release hook invoked exactly once when a [`Blob`] is discarded.
pub type ReleaseFn = Box<dyn FnOnce(NonNull<u8>, usize)>;

/// An opaque binary payload with an externally tracked length and a custom
/// finalizer.
///
/// Unlike [`Value::Bytes`], which the codec owns and copies freely, a blob
/// carries a caller-supplied release hook and can be handed across an
/// ownership boundary; the hook runs exactly once, when the blob is dropped
/// or when the receiver of [`Blob::into_raw`] invokes it.
pub struct Blob {
    ptr: NonNull<u8>,
    len: usize,
    release: Option<ReleaseFn>,
}

impl Blob {
    /// Wraps an externally-owned allocation.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `len` bytes for the lifetime of the
    /// blob, and `release` must be the matching way to dispose of it.
    pub unsafe fn from_raw(ptr: NonNull<u8>, len: usize, release: ReleaseFn) -> Self {
        Self {
            ptr,
            len,
            release: Some(release),
        }
    }

    /// Allocates a fresh core-owned copy of `bytes`; the release hook frees
    /// the copy.
    pub fn copy_from(bytes: &[u8]) -> Self {
        let boxed: Box<[u8]> = bytes.into();
        let len = boxed.len();
        let raw = Box::into_raw(boxed) as *mut u8;
        // Box pointers are never null.
        let ptr = unsafe { NonNull::new_unchecked(raw) };
        let release: ReleaseFn = Box::new(move |p, l| unsafe {
            drop(Box::from_raw(slice::from_raw_parts_mut(p.as_ptr(), l)));
        });
        Self {
            ptr,
            len,
            release: Some(release),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read access to the payload.
    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Transfers the payload out without firing the release hook.
    ///
    /// The caller receives the hook together with the obligation to invoke
    /// it exactly once when the payload is discarded.
    pub fn into_raw(mut self) -> (NonNull<u8>, usize, Option<ReleaseFn>) {
        let release = self.release.take();
        (self.ptr, self.len, release)
    }
}

impl Drop for Blob {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.ptr, self.len);
        }
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob").field("len", &self.len).finish()
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Clone for Blob {
    /// Cloning produces a core-owned copy of the payload; the original's
    /// release hook is unaffected.
    fn clone(&self) -> Self {
        Blob::copy_from(self.as_slice())
    }
}

/// Dynamic value tree spanning everything the classic MessagePack tag set
/// can represent.
///
/// `Map` pairs keep insertion order; keys may be any variant and no
/// uniqueness is enforced. `Bytes` is the raw/string wire family; `Blob` is
/// the binary (`bin8/16/32`) family with its distinct ownership rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Blob(Blob),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Classifies a host number: integral values become `Int`, everything
    /// else `Float`.
    pub fn number(n: f64) -> Value {
        if n.is_finite() && n.floor() == n {
            Value::Int(n as i64)
        } else {
            Value::Float(n)
        }
    }

    /// Byte-string value from UTF-8 text.
    pub fn str(s: &str) -> Value {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Float(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(s.into_bytes())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Bytes(s.into_bytes()),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (Value::Bytes(k.into_bytes()), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::json!(i),
            Value::Float(f) => serde_json::json!(f),
            Value::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => serde_json::Value::String(s),
                Err(e) => serde_json::Value::String(format!(
                    "data:application/octet-stream;base64,{}",
                    BASE64.encode(e.as_bytes())
                )),
            },
            Value::Blob(_) => serde_json::Value::Null,
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(pairs) => serde_json::Value::Object(
                pairs
                    .into_iter()
                    .map(|(k, v)| (json_key(k), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// JSON object keys must be strings; stringify non-string map keys.
fn json_key(key: Value) -> String {
    match key {
        Value::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => "null".to_string(),
    }
}
