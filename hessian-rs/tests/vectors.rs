//! Byte-exact coverage of the concrete scenarios: small integers, longs,
//! UTF-8 strings, booleans/null, lists, shared-identity references, and
//! class-defined objects.

use hessian_rs::{decode, encode, ClassDefinition, Encoder, Value};

#[test]
fn int_edges_round_trip_to_exact_bytes() {
    assert_eq!(encode(&Value::Int(0)).unwrap(), vec![0x90]);
    assert_eq!(decode(&[0x90]).unwrap(), Value::Int(0));

    assert_eq!(encode(&Value::Int(-16)).unwrap(), vec![0x80]);
    assert_eq!(encode(&Value::Int(47)).unwrap(), vec![0xbf]);
    assert_eq!(encode(&Value::Int(48)).unwrap(), vec![0xc8, 0x30]);
}

#[test]
fn long_edges_round_trip_to_exact_bytes() {
    assert_eq!(encode(&Value::Long(0)).unwrap(), vec![0xe0]);
    assert_eq!(encode(&Value::Long(15)).unwrap(), vec![0xef]);
}

#[test]
fn utf8_string_length_is_code_points_not_bytes() {
    let bytes = encode(&Value::String("中文".into())).unwrap();
    assert_eq!(bytes, vec![0x02, 0xe4, 0xb8, 0xad, 0xe6, 0x96, 0x87]);
    assert_eq!(decode(&bytes).unwrap(), Value::String("中文".into()));
}

#[test]
fn bool_and_null_tags() {
    assert_eq!(encode(&Value::Bool(true)).unwrap(), vec![0x54]);
    assert_eq!(encode(&Value::Bool(false)).unwrap(), vec![0x46]);
    assert_eq!(encode(&Value::Null).unwrap(), vec![0x4e]);
}

#[test]
fn two_element_list_uses_ref_id_zero() {
    let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
    let bytes = encode(&list).unwrap();
    assert_eq!(bytes, vec![0x56, 0x6e, 0x02, 0x91, 0x92, 0x7a]);

    let decoded = decode(&bytes).unwrap();
    match decoded {
        Value::List(handle) => {
            assert_eq!(
                handle.borrow().items,
                vec![Value::Int(1), Value::Int(2)]
            );
        }
        other => panic!("expected a list, got {other:?}"),
    }
}

#[test]
fn shared_list_identity_survives_round_trip() {
    let inner = Value::list(vec![]);
    let outer = Value::list(vec![inner.clone(), inner.clone()]);
    let bytes = encode(&outer).unwrap();
    // outer: V n 02 [inner: V n 00 z] [ref 1] z
    assert_eq!(
        bytes,
        vec![0x56, 0x6e, 0x02, 0x56, 0x6e, 0x00, 0x7a, 0x4a, 0x01, 0x7a]
    );

    let decoded = decode(&bytes).unwrap();
    match decoded {
        Value::List(handle) => {
            let data = handle.borrow();
            match (&data.items[0], &data.items[1]) {
                (Value::List(a), Value::List(b)) => {
                    assert!(std::rc::Rc::ptr_eq(a, b));
                }
                other => panic!("expected two lists, got {other:?}"),
            }
        }
        other => panic!("expected a list, got {other:?}"),
    }
}

#[test]
fn object_round_trips_class_name_field_order_and_values() {
    let mut encoder = Encoder::new();
    encoder
        .register_class(0, "p", &["n".to_string(), "a".to_string()])
        .unwrap();
    let instance = Value::Object(std::rc::Rc::new(std::cell::RefCell::new(
        hessian_rs::ObjectData {
            class_def_id: 0,
            fields: vec![Value::String("x".into()), Value::Int(20)],
        },
    )));
    encoder.encode_value(&instance).unwrap();
    let bytes = encoder.into_bytes();

    assert_eq!(bytes[0], 0x4f); // 'O'
    assert!(bytes.contains(&0x6f)); // 'o' instance tag somewhere after the class def

    let mut decoder = hessian_rs::Decoder::new(&bytes);
    let decoded = decoder.decode_value().unwrap();
    let classes = decoder.class_definitions();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].class_name, "p");
    assert_eq!(classes[0].field_names, vec!["n", "a"]);

    match decoded {
        Value::Object(handle) => {
            let data = handle.borrow();
            assert_eq!(data.fields, vec![Value::String("x".into()), Value::Int(20)]);
        }
        other => panic!("expected an object, got {other:?}"),
    }
}

#[test]
fn class_definition_helper_constructs_expected_shape() {
    let class = ClassDefinition::new("p", vec!["n".into(), "a".into()]);
    assert_eq!(class.class_name, "p");
    assert_eq!(class.field_names.len(), 2);
}
