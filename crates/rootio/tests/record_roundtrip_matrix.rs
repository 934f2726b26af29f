//! Encode/decode matrix over the built-in record types and their historical
//! layouts.

use std::sync::Arc;

use proptest::prelude::*;
use rootio::rbase::{Named, ObjString, Object, ProcessId, Ref, Uuid, HAS_UUID};
use rootio::rcont::{ArrayC, ArrayD, ArrayF, ArrayI, ArrayL, ArrayL64, ArrayS, List, Map, ObjArray};
use rootio::{to_bytes, DecodeError, IdentityTable, ObjectRef, RBuffer, Record, RecordState, WBuffer};

fn roundtrip<T: Record + Default + PartialEq + std::fmt::Debug>(value: &T) -> T {
    let data = to_bytes(value).unwrap();
    let mut table = IdentityTable::new();
    let mut r = RBuffer::new(&data, &mut table);
    let out = r.decode_record::<T>().unwrap();
    assert_eq!(out.state, RecordState::Complete);
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    assert_eq!(r.remaining(), 0, "{} left bytes behind", value.class_name());
    out.record
}

fn arc<T: Record + 'static>(rec: T) -> ObjectRef {
    Arc::new(rec)
}

// ---------------------------------------------------------------------------
// Base records
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_base_records() {
    let obj = Object::new();
    assert_eq!(roundtrip(&obj), obj);

    let named = Named::new("h1", "a title with spaces");
    assert_eq!(roundtrip(&named), named);

    let s = ObjString::new("payload");
    assert_eq!(roundtrip(&s), s);

    let uuid = Uuid::new([7; 16]);
    assert_eq!(roundtrip(&uuid), uuid);

    let pid = ProcessId::new("ProcessID0", "3c9a9a40-1b2c-11e0-8000-0123456789ab");
    assert_eq!(roundtrip(&pid), pid);

    let mut reference = Ref::new(12);
    reference.pidf = 1;
    assert_eq!(roundtrip(&reference), reference);

    let mut by_uuid = Ref::new(13);
    by_uuid.obj.bits |= HAS_UUID;
    by_uuid.uuid = Some("3c9a9a40-1b2c-11e0-8000-0123456789ab".into());
    assert_eq!(roundtrip(&by_uuid), by_uuid);
}

#[test]
fn roundtrip_referenced_object() {
    let mut named = Named::new("target", "");
    named.obj = Object::referenced(42);
    named.obj.pidf = 2;
    assert_eq!(roundtrip(&named), named);
}

#[test]
fn roundtrip_arrays() {
    assert_eq!(roundtrip(&ArrayC::new(vec![-128, 0, 127])).data, vec![-128, 0, 127]);
    assert_eq!(roundtrip(&ArrayS::new(vec![i16::MIN, i16::MAX])).data, vec![i16::MIN, i16::MAX]);
    assert_eq!(roundtrip(&ArrayI::new(vec![])).data, Vec::<i32>::new());
    assert_eq!(roundtrip(&ArrayL::new(vec![i64::MIN])).data, vec![i64::MIN]);
    assert_eq!(roundtrip(&ArrayL64::new(vec![1, 2, 3])).data, vec![1, 2, 3]);
    assert_eq!(roundtrip(&ArrayF::new(vec![0.5, -1.25])).data, vec![0.5, -1.25]);
    assert_eq!(roundtrip(&ArrayD::new(vec![1e300, -0.0])).data, vec![1e300, -0.0]);
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_list_with_options() {
    let mut list = List::new();
    list.name = "histos".into();
    list.push(arc(Named::new("h1", "first")));
    list.push_with_option(arc(ObjString::new("s")), "same");
    list.push_with_option(arc(ArrayD::new(vec![1.0, 2.0])), "x".repeat(300));
    assert_eq!(roundtrip(&list), list);
}

#[test]
fn roundtrip_nested_containers() {
    let mut inner = List::new();
    inner.push(arc(Named::new("leaf", "")));

    let mut arr = ObjArray::new();
    arr.low = 1;
    arr.slots = vec![Some(arc(inner)), None, Some(arc(ObjString::new("tail")))];

    let mut map = Map::new();
    map.insert(arc(ObjString::new("k1")), Some(arc(arr)));
    map.insert(arc(ObjString::new("k2")), None);

    let got = roundtrip(&map);
    assert_eq!(got, map);

    let value = got.get(&ObjString::new("k1")).unwrap();
    let arr = value.downcast_ref::<ObjArray>().unwrap();
    assert!(arr.at(1).unwrap().is::<List>());
    assert!(arr.at(2).is_none());
    assert!(arr.at(0).is_none());
    assert!(got.get(&ObjString::new("k2")).is_none());
}

#[test]
fn map_drops_null_keys() {
    let mut w = WBuffer::new();
    let token = w.write_version(Map::VERSION);
    Object::new().encode(&mut w).unwrap();
    w.write_string("").unwrap();
    w.write_i32(2);
    w.write_object_any(None).unwrap();
    w.write_object_any(Some(&arc(ObjString::new("orphan")))).unwrap();
    w.write_object_any(Some(&arc(ObjString::new("key")))).unwrap();
    w.write_object_any(None).unwrap();
    w.set_byte_count(token, Map::CLASS).unwrap();
    let data = w.into_bytes();

    let mut table = IdentityTable::new();
    let mut r = RBuffer::new(&data, &mut table);
    let map = r.decode_record::<Map>().unwrap().record;
    assert_eq!(map.len(), 1);
    assert_eq!(map.pairs[0].0.downcast_ref::<ObjString>().unwrap().value, "key");
}

#[test]
fn json_view_describes_tree() {
    let mut list = List::new();
    list.name = "l".into();
    list.push(arc(Named::new("h1", "t")));
    let view = list.to_json();
    assert_eq!(view["class"], "TList");
    assert_eq!(view["entries"][0]["class"], "TNamed");
    assert_eq!(view["entries"][0]["name"], "h1");
}

// ---------------------------------------------------------------------------
// TList historical layouts
// ---------------------------------------------------------------------------

fn legacy_list(version: i16) -> Vec<u8> {
    let a = arc(Named::new("a", ""));
    let b = arc(ObjString::new("b"));
    let mut w = WBuffer::new();
    let token = w.write_version(version);
    if version > 2 {
        Object::new().encode(&mut w).unwrap();
    }
    if version > 1 {
        w.write_string("legacy").unwrap();
    }
    w.write_i32(2);
    for (obj, opt) in [(&a, "opt"), (&b, "")] {
        w.write_object_any(Some(obj)).unwrap();
        match version {
            5 => w.write_string(opt).unwrap(),
            4 => {
                w.write_u8(opt.len() as u8);
                w.write_bytes(opt.as_bytes());
            }
            _ => {}
        }
    }
    w.set_byte_count(token, List::CLASS).unwrap();
    w.into_bytes()
}

#[test]
fn list_versions_dispatch() {
    for version in 1..=5 {
        let data = legacy_list(version);
        let mut table = IdentityTable::new();
        let mut r = RBuffer::new(&data, &mut table);
        let out = r
            .decode_record::<List>()
            .unwrap_or_else(|err| panic!("v{version}: {err}"));
        assert!(out.warnings.is_empty(), "v{version}: {:?}", out.warnings);
        assert_eq!(r.remaining(), 0, "v{version}");

        let list = out.record;
        assert_eq!(list.len(), 2);
        let expected_name = if version > 1 { "legacy" } else { "" };
        assert_eq!(list.name, expected_name, "v{version}");
        let expected_opt = if version > 3 { "opt" } else { "" };
        assert_eq!(list.entries[0].option, expected_opt, "v{version}");
        assert!(list.entries[0].obj.as_ref().unwrap().is::<Named>());
        assert!(list.entries[1].obj.as_ref().unwrap().is::<ObjString>());
    }
}

#[test]
fn legacy_list_is_rewritten_as_newest_layout() {
    let data = legacy_list(3);
    let mut table = IdentityTable::new();
    let mut r = RBuffer::new(&data, &mut table);
    let list = r.decode_record::<List>().unwrap().record;

    let rewritten = to_bytes(&list).unwrap();
    assert_eq!(&rewritten[4..6], &[0, 5]);
    assert_eq!(roundtrip(&list), list);
}

#[test]
fn obj_array_v2_has_no_object_base() {
    let mut w = WBuffer::new();
    let token = w.write_version(2);
    w.write_string("arr").unwrap();
    w.write_i32(1);
    w.write_i32(0);
    w.write_object_any(Some(&arc(ObjString::new("only")))).unwrap();
    w.set_byte_count(token, ObjArray::CLASS).unwrap();
    let data = w.into_bytes();

    let mut table = IdentityTable::new();
    let mut r = RBuffer::new(&data, &mut table);
    let out = r.decode_record::<ObjArray>().unwrap();
    assert!(!out.is_flagged());
    assert_eq!(out.record.name, "arr");
    assert_eq!(out.record.obj, Object::new());
}

// ---------------------------------------------------------------------------
// Truncation
// ---------------------------------------------------------------------------

#[test]
fn every_truncated_prefix_is_an_error() {
    let mut list = List::new();
    list.name = "cut".into();
    list.push(arc(Named::new("n", "t")));
    list.push(arc(Ref::new(3)));
    list.push(arc(ArrayI::new(vec![1, 2, 3])));
    let data = to_bytes(&list).unwrap();

    for cut in 0..data.len() {
        let mut table = IdentityTable::new();
        let mut r = RBuffer::new(&data[..cut], &mut table);
        let res = r.decode_record::<List>();
        assert!(res.is_err(), "prefix of {cut} bytes decoded");
        assert_eq!(r.pos(), 0, "prefix of {cut} bytes moved the cursor");
        assert!(table.is_empty());
    }
}

#[test]
fn truncated_fixed_array_reports_eof() {
    let data = to_bytes(&ArrayD::new(vec![1.0, 2.0])).unwrap();
    let mut table = IdentityTable::new();
    let mut r = RBuffer::new(&data[..data.len() - 1], &mut table);
    assert!(matches!(
        r.decode_record::<ArrayD>(),
        Err(DecodeError::UnexpectedEof { .. })
    ));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn bytes() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..300)
}

proptest! {
    #[test]
    fn prop_named_roundtrip(name in bytes(), title in bytes(), id in any::<u32>()) {
        let mut named = Named::new(name, title);
        named.obj.id = id;
        prop_assert_eq!(roundtrip(&named), named);
    }

    #[test]
    fn prop_array_roundtrip(data in proptest::collection::vec(-1e12f64..1e12, 0..64)) {
        let arr = ArrayD::new(data);
        prop_assert_eq!(roundtrip(&arr), arr);
    }

    #[test]
    fn prop_list_roundtrip(names in proptest::collection::vec("[a-z]{0,12}", 0..12)) {
        let mut list = List::new();
        for name in &names {
            list.push_with_option(arc(ObjString::new(name.as_str())), name.as_str());
        }
        prop_assert_eq!(roundtrip(&list), list);
    }
}
