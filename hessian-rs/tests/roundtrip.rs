//! Property-style coverage of the invariants: round-trip for acyclic
//! values, ref-table density, numeric ladder tightness, and terminator
//! presence.

use hessian_rs::{decode, encode, Encoder, Value};
use rand::Rng;

fn assert_round_trips(value: Value) {
    let bytes = encode(&value).unwrap();
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, value, "round trip mismatch for {value:?}");
}

#[test]
fn primitives_round_trip() {
    assert_round_trips(Value::Null);
    assert_round_trips(Value::Bool(true));
    assert_round_trips(Value::Bool(false));
    assert_round_trips(Value::Int(0));
    assert_round_trips(Value::Int(i32::MIN));
    assert_round_trips(Value::Int(i32::MAX));
    assert_round_trips(Value::Long(i64::MIN));
    assert_round_trips(Value::Long(i64::MAX));
    assert_round_trips(Value::ForcedDouble(3.5));
    assert_round_trips(Value::Date(1_700_000_000_000));
    assert_round_trips(Value::String("hello, world".into()));
    assert_round_trips(Value::Binary(vec![1, 2, 3, 4, 5]));
}

#[test]
fn random_ints_round_trip_across_every_ladder_rung() {
    let mut rng = rand::thread_rng();
    for _ in 0..2000 {
        let v: i32 = rng.gen();
        assert_round_trips(Value::Int(v));
    }
}

#[test]
fn random_longs_round_trip_across_every_ladder_rung() {
    let mut rng = rand::thread_rng();
    for _ in 0..2000 {
        let v: i64 = rng.gen();
        assert_round_trips(Value::Long(v));
    }
}

#[test]
fn acyclic_list_of_mixed_primitives_round_trips() {
    let list = Value::list(vec![
        Value::Int(1),
        Value::String("two".into()),
        Value::Bool(true),
        Value::Null,
        Value::list(vec![Value::Int(2), Value::Int(3)]),
    ]);
    assert_round_trips(list);
}

#[test]
fn typed_map_preserves_its_type_label_through_a_round_trip() {
    let map = Value::TypedMap(
        "com.example.Money".into(),
        std::rc::Rc::new(std::cell::RefCell::new(hessian_rs::MapData {
            entries: vec![(Value::String("amount".into()), Value::Long(500))],
        })),
    );
    let bytes = encode(&map).unwrap();
    assert_eq!(bytes[0], b'M');
    match decode(&bytes).unwrap() {
        Value::TypedMap(type_name, handle) => {
            assert_eq!(type_name, "com.example.Money");
            assert_eq!(
                handle.borrow().entries,
                vec![(Value::String("amount".into()), Value::Long(500))]
            );
        }
        other => panic!("expected a typed map, got {other:?}"),
    }
}

#[test]
fn string_past_the_short_form_cutoff_round_trips_through_chunk_tags() {
    let long = "x".repeat(40);
    let bytes = encode(&Value::String(long.clone())).unwrap();
    assert_eq!(bytes[0], b'S', "32+ code points must use the final chunk tag");
    assert_eq!(decode(&bytes).unwrap(), Value::String(long));
}

#[test]
fn string_spanning_two_chunks_reassembles_in_order() {
    let long = "y".repeat(hessian_rs::tags::CHUNK_MAX_LEN + 5);
    let bytes = encode(&Value::String(long.clone())).unwrap();
    assert_eq!(bytes[0], b's', "a string needing a second chunk must start non-final");
    assert_eq!(decode(&bytes).unwrap(), Value::String(long));
}

#[test]
fn binary_past_the_short_form_cutoff_round_trips_through_chunk_tags() {
    let long = vec![0x42u8; 20];
    let bytes = encode(&Value::Binary(long.clone())).unwrap();
    assert_eq!(bytes[0], b'B', "16+ bytes must use the final chunk tag");
    assert_eq!(decode(&bytes).unwrap(), Value::Binary(long));
}

#[test]
fn binary_spanning_two_chunks_reassembles_in_order() {
    let long = vec![0x7eu8; hessian_rs::tags::CHUNK_MAX_LEN + 5];
    let bytes = encode(&Value::Binary(long.clone())).unwrap();
    assert_eq!(bytes[0], b'b', "binary needing a second chunk must start non-final");
    assert_eq!(decode(&bytes).unwrap(), Value::Binary(long));
}

#[test]
fn list_type_prefix_and_type_back_reference_both_decode_to_the_same_type_name() {
    // 'V' 't' "Foo" 'n' 01 [int 1] 'z' -- a typed list carrying one element,
    // registering "Foo" as type_refs[0].
    let typed = [
        b'V', b't', 0x00, 0x03, b'F', b'o', b'o', b'n', 0x01, 0x91, b'z',
    ];
    // 'v' 0x90 'n' 01 [int 2] 'z' -- a second list referring back to that
    // type by index instead of spelling it out again.
    let via_type_ref = [b'v', 0x90, b'n', 0x01, 0x92, b'z'];

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&typed);
    bytes.extend_from_slice(&via_type_ref);

    let mut decoder = hessian_rs::Decoder::new(&bytes);
    match decoder.decode_value().unwrap() {
        Value::List(handle) => {
            let data = handle.borrow();
            assert_eq!(data.type_name.as_deref(), Some("Foo"));
            assert_eq!(data.items, vec![Value::Int(1)]);
        }
        other => panic!("expected a list, got {other:?}"),
    }
    match decoder.decode_value().unwrap() {
        Value::List(handle) => {
            let data = handle.borrow();
            assert_eq!(data.type_name.as_deref(), Some("Foo"));
            assert_eq!(data.items, vec![Value::Int(2)]);
        }
        other => panic!("expected a list, got {other:?}"),
    }
}

#[test]
fn self_referential_list_round_trips_as_an_unresolved_back_reference() {
    let handle: hessian_rs::ListHandle =
        std::rc::Rc::new(std::cell::RefCell::new(hessian_rs::ListData {
            items: vec![Value::Int(1)],
            type_name: None,
        }));
    handle.borrow_mut().items.push(Value::List(handle.clone()));
    let bytes = encode(&Value::List(handle)).unwrap();

    match decode(&bytes).unwrap() {
        Value::List(handle) => {
            let data = handle.borrow();
            assert_eq!(data.items[0], Value::Int(1));
            assert_eq!(data.items[1], Value::Ref(0));
        }
        other => panic!("expected a list, got {other:?}"),
    }
}

#[test]
fn self_referential_object_round_trips_as_an_unresolved_back_reference() {
    let mut encoder = Encoder::new();
    encoder
        .register_class(0, "Node", &["next".to_string()])
        .unwrap();
    let handle: hessian_rs::ObjectHandle =
        std::rc::Rc::new(std::cell::RefCell::new(hessian_rs::ObjectData {
            class_def_id: 0,
            fields: vec![Value::Null],
        }));
    handle.borrow_mut().fields[0] = Value::Object(handle.clone());
    encoder.encode_value(&Value::Object(handle)).unwrap();
    let bytes = encoder.into_bytes();

    let mut decoder = hessian_rs::Decoder::new(&bytes);
    let decoded = decoder.decode_value().unwrap();
    match decoded {
        Value::Object(handle) => {
            let data = handle.borrow();
            assert_eq!(data.fields, vec![Value::Ref(0)]);
        }
        other => panic!("expected an object, got {other:?}"),
    }
}

#[test]
fn untyped_map_preserves_insertion_order() {
    let map = Value::map(vec![
        (Value::String("z".into()), Value::Int(1)),
        (Value::String("a".into()), Value::Int(2)),
    ]);
    let bytes = encode(&map).unwrap();
    match decode(&bytes).unwrap() {
        Value::UntypedMap(handle) => {
            let data = handle.borrow();
            assert_eq!(data.entries[0].0, Value::String("z".into()));
            assert_eq!(data.entries[1].0, Value::String("a".into()));
        }
        other => panic!("expected an untyped map, got {other:?}"),
    }
}

#[test]
fn numeric_ladder_emits_exactly_the_declared_byte_count() {
    assert_eq!(encode(&Value::Int(0)).unwrap().len(), 1);
    assert_eq!(encode(&Value::Int(1000)).unwrap().len(), 2);
    assert_eq!(encode(&Value::Int(100_000)).unwrap().len(), 3);
    assert_eq!(encode(&Value::Int(i32::MAX)).unwrap().len(), 5);
    assert_eq!(encode(&Value::Long(0)).unwrap().len(), 1);
    assert_eq!(encode(&Value::Long(i64::MAX)).unwrap().len(), 9);
}

#[test]
fn every_list_emission_has_exactly_one_matching_terminator() {
    let bytes = encode(&Value::list(vec![Value::list(vec![Value::Int(1)])])).unwrap();
    assert_eq!(bytes.iter().filter(|&&b| b == b'z').count(), 2);
}

#[test]
fn ref_table_is_dense_and_monotone_across_nested_composites() {
    let a = Value::list(vec![]);
    let b = Value::list(vec![Value::Int(1)]);
    let outer = Value::list(vec![a, b.clone(), b]);
    let bytes = encode(&outer).unwrap();
    let decoded = decode(&bytes).unwrap();
    match decoded {
        Value::List(handle) => {
            let data = handle.borrow();
            match (&data.items[1], &data.items[2]) {
                (Value::List(x), Value::List(y)) => assert!(std::rc::Rc::ptr_eq(x, y)),
                other => panic!("expected two lists, got {other:?}"),
            }
        }
        other => panic!("expected a list, got {other:?}"),
    }
}

#[test]
fn forward_reference_is_rejected() {
    assert!(decode(&[0x4a, 0x00]).is_err());
}

#[test]
fn truncated_input_is_rejected_rather_than_panicking() {
    assert!(decode(&[0x56, 0x6e, 0x02, 0x91]).is_err());
    assert!(decode(&[0x49]).is_err());
    assert!(decode(&[]).is_err());
}
