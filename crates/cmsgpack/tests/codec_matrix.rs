use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use cmsgpack::{
    pack, pack_into, unpack, Allocator, Blob, CodecError, GrowableBuffer, Heap, Value, MAX_NESTING,
};

fn bytes_map(fields: &[(&str, Value)]) -> Value {
    Value::Map(
        fields
            .iter()
            .map(|(k, v)| (Value::str(k), v.clone()))
            .collect(),
    )
}

#[test]
fn integer_shortest_encoding_matrix() {
    let cases: &[(i64, &[u8])] = &[
        (0, &[0x00]),
        (127, &[0x7f]),
        (128, &[0xcc, 0x80]),
        (255, &[0xcc, 0xff]),
        (256, &[0xcd, 0x01, 0x00]),
        (65535, &[0xcd, 0xff, 0xff]),
        (65536, &[0xce, 0x00, 0x01, 0x00, 0x00]),
        (4294967295, &[0xce, 0xff, 0xff, 0xff, 0xff]),
        (
            4294967296,
            &[0xcf, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00],
        ),
        (-1, &[0xff]),
        (-32, &[0xe0]),
        (-33, &[0xd0, 0xdf]),
        (-128, &[0xd0, 0x80]),
        (-129, &[0xd1, 0xff, 0x7f]),
        (-32768, &[0xd1, 0x80, 0x00]),
        (-32769, &[0xd2, 0xff, 0xff, 0x7f, 0xff]),
    ];
    for (n, expected) in cases {
        let encoded = pack(&Value::Int(*n)).unwrap();
        assert_eq!(&encoded, expected, "wrong encoding for {n}");
        assert_eq!(unpack(&encoded).unwrap(), Value::Int(*n));
    }
}

#[test]
fn float_narrowing_matrix() {
    // 2.5 survives the f32 round trip, 0.1 does not.
    let narrow = pack(&Value::Float(2.5)).unwrap();
    assert_eq!(narrow[0], 0xca);
    assert_eq!(narrow.len(), 5);
    assert_eq!(unpack(&narrow).unwrap(), Value::Float(2.5));

    let wide = pack(&Value::Float(0.1)).unwrap();
    assert_eq!(wide[0], 0xcb);
    assert_eq!(wide.len(), 9);
    assert_eq!(unpack(&wide).unwrap(), Value::Float(0.1));
}

#[test]
fn array_map_heuristic_matrix() {
    let keys = |ks: &[i64]| {
        Value::Map(
            ks.iter()
                .map(|k| (Value::Int(*k), Value::Bool(true)))
                .collect(),
        )
    };

    assert_eq!(pack(&keys(&[1, 2, 3])).unwrap()[0], 0x93);
    assert_eq!(pack(&keys(&[1, 2, 4])).unwrap()[0], 0x83); // gap
    assert_eq!(pack(&keys(&[2, 3, 4])).unwrap()[0], 0x83); // no key 1
    assert_eq!(pack(&keys(&[])).unwrap(), vec![0x90]); // empty -> array 0
    assert_eq!(pack(&keys(&[0, 1, 2])).unwrap()[0], 0x83); // non-positive key
}

#[test]
fn nesting_ceiling_truncates_to_nil() {
    let mut value = Value::Int(42);
    for _ in 0..20 {
        value = Value::Array(vec![value]);
    }
    let encoded = pack(&value).unwrap();
    let decoded = unpack(&encoded).unwrap();

    // The first MAX_NESTING levels survive; the container at the ceiling
    // came back as nil, not as the original array.
    let mut node = &decoded;
    for depth in 0..MAX_NESTING {
        match node {
            Value::Array(items) => {
                assert_eq!(items.len(), 1, "level {depth}");
                node = &items[0];
            }
            other => panic!("expected array at level {depth}, got {other:?}"),
        }
    }
    assert_eq!(node, &Value::Nil);
}

#[test]
fn truncation_matrix() {
    assert_eq!(unpack(&[]), Err(CodecError::Eof));
    assert_eq!(unpack(&[0xce]), Err(CodecError::Eof));
    assert_eq!(unpack(&[0xda, 0x00, 0x05, b'a']), Err(CodecError::Eof));
    assert_eq!(unpack(&[0xc4, 0x02, 0xaa]), Err(CodecError::Eof));
}

#[test]
fn bad_tag_matrix() {
    assert_eq!(unpack(&[0xc1]), Err(CodecError::BadFormat));
}

#[test]
fn trailing_data_after_complete_value() {
    assert_eq!(unpack(&[0xc0, 0xc0]), Err(CodecError::TrailingData));

    let mut arr_then_junk = pack(&Value::Array(vec![Value::Int(1)])).unwrap();
    arr_then_junk.push(0x00);
    assert_eq!(unpack(&arr_then_junk), Err(CodecError::TrailingData));
}

#[test]
fn round_trip_matrix() {
    let values = vec![
        Value::Nil,
        Value::Bool(true),
        Value::Bool(false),
        Value::Int(123),
        Value::Int(i64::MIN),
        Value::Int(i64::MAX),
        Value::Float(3_456.123_456_789),
        Value::Float(f64::NEG_INFINITY),
        Value::str(""),
        Value::str("abc"),
        Value::Bytes(vec![0u8, 1, 2, 255]),
        Value::Bytes(vec![b'a'; 32]),
        Value::Bytes(vec![b'b'; 70_000]),
        Value::Array(vec![]),
        Value::Array(vec![
            Value::Int(1),
            Value::Array(vec![Value::Int(2)]),
            bytes_map(&[("k", Value::Bool(true))]),
        ]),
        Value::Array((1..=16).map(Value::Int).collect()),
        bytes_map(&[
            ("foo", Value::str("bar")),
            ("baz", Value::Nil),
            ("n", Value::Int(-7)),
        ]),
        // mixed keys: byte-string key keeps this on the map path
        Value::Map(vec![
            (Value::str("a"), Value::Int(1)),
            (Value::Int(2), Value::Int(2)),
        ]),
    ];

    for value in values {
        let encoded = pack(&value).unwrap();
        let decoded = unpack(&encoded)
            .unwrap_or_else(|e| panic!("decode failed for {value:?}: {e}"));
        assert_eq!(decoded, value);
    }
}

#[test]
fn map_pairs_keep_insertion_order() {
    let value = bytes_map(&[("z", Value::Int(1)), ("a", Value::Int(2))]);
    let decoded = unpack(&pack(&value).unwrap()).unwrap();
    match decoded {
        Value::Map(pairs) => {
            assert_eq!(pairs[0].0, Value::str("z"));
            assert_eq!(pairs[1].0, Value::str("a"));
        }
        other => panic!("expected map, got {other:?}"),
    }
}

#[test]
fn blob_release_fires_exactly_once() {
    let released = Rc::new(Cell::new(0u32));
    let counter = released.clone();
    let mut payload = b"abcdef".to_vec();
    let ptr = NonNull::new(payload.as_mut_ptr()).unwrap();

    let blob = unsafe {
        Blob::from_raw(
            ptr,
            payload.len(),
            Box::new(move |_, _| counter.set(counter.get() + 1)),
        )
    };
    let value = Value::Blob(blob);

    // Encoding reads the payload by (pointer, length) without consuming it.
    let encoded = pack(&value).unwrap();
    assert_eq!(&encoded[..2], &[0xc4, 6]);
    assert_eq!(&encoded[2..], b"abcdef");
    assert_eq!(released.get(), 0);

    drop(value);
    assert_eq!(released.get(), 1);
}

#[test]
fn decoded_bin_owns_an_independent_copy() {
    let input = vec![0xc4, 0x03, 0x01, 0x02, 0x03];
    let decoded = unpack(&input).unwrap();
    drop(input);
    match decoded {
        Value::Blob(blob) => assert_eq!(blob.as_slice(), &[1, 2, 3]),
        other => panic!("expected blob, got {other:?}"),
    }
}

#[test]
fn raw_family_never_produces_blobs() {
    let decoded = unpack(&[0xa3, b'a', b'b', b'c']).unwrap();
    assert_eq!(decoded, Value::str("abc"));
}

#[test]
fn blob_round_trips_through_bin_family() {
    let value = Value::Blob(Blob::copy_from(&[9u8; 300]));
    let encoded = pack(&value).unwrap();
    assert_eq!(&encoded[..3], &[0xc5, 0x01, 0x2c]);
    assert_eq!(unpack(&encoded).unwrap(), value);
}

/// Allocator that delegates to the heap, counts calls, and frees anything
/// still outstanding when dropped.
struct PoolAlloc {
    heap: Heap,
    live: Option<(NonNull<u8>, usize)>,
    allocs: usize,
}

impl PoolAlloc {
    fn new() -> Self {
        Self {
            heap: Heap,
            live: None,
            allocs: 0,
        }
    }
}

impl Allocator for PoolAlloc {
    fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        self.allocs += 1;
        let ptr = self.heap.allocate(size)?;
        self.live = Some((ptr, size));
        Some(ptr)
    }

    unsafe fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        let grown = self.heap.reallocate(ptr, old_size, new_size)?;
        self.live = Some((grown, new_size));
        Some(grown)
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, size: usize) {
        self.heap.release(ptr, size);
        self.live = None;
    }
}

impl Drop for PoolAlloc {
    fn drop(&mut self) {
        if let Some((ptr, size)) = self.live.take() {
            unsafe { self.heap.release(ptr, size) };
        }
    }
}

#[test]
fn pack_into_external_allocator_matches_pack() {
    let value = bytes_map(&[
        ("list", Value::Array((0..200).map(Value::Int).collect())),
        ("text", Value::Bytes(vec![b'x'; 1000])),
    ]);
    let direct = pack(&value).unwrap();

    let mut alloc = PoolAlloc::new();
    {
        let mut buf = GrowableBuffer::with_allocator(&mut alloc);
        pack_into(&value, &mut buf).unwrap();
        assert_eq!(buf.as_slice(), &direct[..]);
        let (ptr, len) = buf.raw_parts();
        assert!(!ptr.is_null());
        assert_eq!(len, direct.len());
    }
    // the storage outlives the buffer; the collaborator still holds it
    assert_eq!(alloc.allocs, 1);
    assert!(alloc.live.is_some());
}
