//! Writer/Reader roundtrip matrix and string-framing edge cases.

use proptest::prelude::*;
use rootio_buffers::{BufferError, Reader, RootString, Writer};

// ---------------------------------------------------------------------------
// Primitive roundtrips
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn roundtrip_integers(a in any::<u8>(), b in any::<i16>(), c in any::<u32>(), d in any::<i64>()) {
        let mut w = Writer::new();
        w.u8(a);
        w.i16(b);
        w.u32(c);
        w.i64(d);
        let data = w.flush();
        prop_assert_eq!(data.len(), 1 + 2 + 4 + 8);
        let mut r = Reader::new(&data);
        prop_assert_eq!(r.u8(), Ok(a));
        prop_assert_eq!(r.i16(), Ok(b));
        prop_assert_eq!(r.u32(), Ok(c));
        prop_assert_eq!(r.i64(), Ok(d));
        prop_assert!(r.is_eof());
    }

    #[test]
    fn roundtrip_floats_bitwise(a in any::<f32>(), b in any::<f64>()) {
        let mut w = Writer::new();
        w.f32(a);
        w.f64(b);
        let data = w.flush();
        let mut r = Reader::new(&data);
        prop_assert_eq!(r.f32().map(f32::to_bits), Ok(a.to_bits()));
        prop_assert_eq!(r.f64().map(f64::to_bits), Ok(b.to_bits()));
    }

    #[test]
    fn roundtrip_arbitrary_string_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..600)) {
        let mut w = Writer::new();
        w.string(&bytes).unwrap();
        let data = w.flush();
        let mut r = Reader::new(&data);
        prop_assert_eq!(r.string(), Ok(RootString::from(bytes)));
        prop_assert!(r.is_eof());
    }

    #[test]
    fn every_truncated_prefix_fails(value in any::<u64>()) {
        let mut w = Writer::new();
        w.u64(value);
        let data = w.flush();
        for cut in 0..data.len() {
            let mut r = Reader::new(&data[..cut]);
            prop_assert!(r.u64().is_err());
            prop_assert_eq!(r.position(), 0);
        }
    }
}

// ---------------------------------------------------------------------------
// String length boundaries
// ---------------------------------------------------------------------------

fn encoded_string_len(n: usize) -> usize {
    let mut w = Writer::new();
    w.string(vec![b'z'; n]).unwrap();
    w.len()
}

#[test]
fn string_length_prefix_boundaries() {
    assert_eq!(encoded_string_len(0), 1);
    assert_eq!(encoded_string_len(1), 2);
    assert_eq!(encoded_string_len(254), 255);
    assert_eq!(encoded_string_len(255), 5 + 255);
    assert_eq!(encoded_string_len(256), 5 + 256);
    assert_eq!(encoded_string_len(65536), 5 + 65536);
}

#[test]
fn string_boundaries_read_back() {
    for n in [0usize, 1, 254, 255, 256, 65536] {
        let mut w = Writer::new();
        w.string(vec![b'q'; n]).unwrap();
        let data = w.flush();
        let mut r = Reader::new(&data);
        let s = r.string().unwrap();
        assert_eq!(s.len(), n, "length {n}");
        assert!(r.is_eof(), "length {n}");
    }
}

#[test]
fn empty_string_is_single_zero_byte() {
    let mut w = Writer::new();
    w.string("").unwrap();
    assert_eq!(w.as_slice(), &[0]);
}

#[test]
fn long_string_with_truncated_length_fails() {
    let data = [255, 0, 0];
    let mut r = Reader::new(&data);
    assert!(matches!(r.string(), Err(BufferError::EndOfBuffer { .. })));
    assert_eq!(r.position(), 0);
}

// ---------------------------------------------------------------------------
// Offsets and backpatching
// ---------------------------------------------------------------------------

#[test]
fn absolute_positions_follow_offset() {
    let mut w = Writer::with_offset(64);
    w.u32(0);
    let mark = w.position() - 4;
    w.string("payload").unwrap();
    let len = (w.position() - mark - 4) as u32;
    w.patch_u32(mark, len | 0x4000_0000).unwrap();
    let data = w.flush();

    let mut r = Reader::with_offset(&data, 64);
    let word = r.u32().unwrap();
    assert_eq!(word & 0x3FFF_FFFF, len);
    assert_eq!(r.string().unwrap(), "payload");
    assert_eq!(r.position(), 64 + data.len());
}

#[test]
fn flush_keeps_absolute_position() {
    let mut w = Writer::new();
    w.u16(1);
    let first = w.flush();
    assert_eq!(first.len(), 2);
    assert_eq!(w.position(), 2);
    assert!(w.is_empty());
}
