#![deny(missing_docs, missing_debug_implementations)]

//! A JSON-style debug printer for [`hessian_rs`] value graphs.
//!
//! This crate has no stake in the wire format itself; it exists so a
//! decoded [`Value`] can be inspected as plain JSON without re-deriving
//! class field names or hand-rolling a pretty-printer. Binary values
//! with no natural JSON representation are hex-encoded; dates and
//! unresolved references are rendered as tagged single-key objects the
//! way MongoDB's Extended JSON renders non-native BSON types.
//!
//! ```
//! use hessian_rs::Value;
//! use hessian_rs_json::to_json;
//!
//! let value = Value::list(vec![Value::Int(1), Value::String("a".into())]);
//! let json = to_json(&value, &[]);
//! assert_eq!(json, serde_json::json!([1, "a"]));
//! ```

use std::rc::Rc;

use hessian_rs::{ClassDefinition, Value, ValueSnapshot};
use serde_json::{json, Value as Json};

/// Renders `value` as a [`serde_json::Value`], resolving any `Object`
/// variants against `classes` to recover field names.
pub fn to_json(value: &Value, classes: &[Rc<ClassDefinition>]) -> Json {
    snapshot_to_json(&ValueSnapshot::from_value(value, classes))
}

/// Renders an already-built [`ValueSnapshot`] as a [`serde_json::Value`].
pub fn snapshot_to_json(snapshot: &ValueSnapshot) -> Json {
    match snapshot {
        ValueSnapshot::Null => Json::Null,
        ValueSnapshot::Bool(b) => Json::Bool(*b),
        ValueSnapshot::Int(i) => json!(*i),
        ValueSnapshot::Long(l) => json!(*l),
        ValueSnapshot::Double(d) => json!(*d),
        ValueSnapshot::Date(ms) => json!({ "$date": ms }),
        ValueSnapshot::Binary(bytes) => json!({ "$binary": hex_encode(bytes) }),
        ValueSnapshot::String(s) => Json::String(s.clone()),
        ValueSnapshot::List(items) => {
            Json::Array(items.iter().map(snapshot_to_json).collect())
        }
        ValueSnapshot::Map(type_name, entries) => {
            let pairs: Vec<Json> = entries
                .iter()
                .map(|(k, v)| json!([snapshot_to_json(k), snapshot_to_json(v)]))
                .collect();
            match type_name {
                Some(name) => json!({ "$type": name, "$entries": pairs }),
                None => json!({ "$entries": pairs }),
            }
        }
        ValueSnapshot::Object(record) => {
            let mut map = serde_json::Map::new();
            map.insert(
                "$class".to_string(),
                Json::String(record.class_name.clone()),
            );
            for (name, value) in &record.fields {
                map.insert(name.clone(), snapshot_to_json(value));
            }
            Json::Object(map)
        }
        ValueSnapshot::Ref(id) => json!({ "$ref": id }),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hessian_rs::ObjectData;
    use std::cell::RefCell;

    #[test]
    fn renders_primitives() {
        assert_eq!(to_json(&Value::Null, &[]), Json::Null);
        assert_eq!(to_json(&Value::Bool(true), &[]), json!(true));
        assert_eq!(to_json(&Value::Int(5), &[]), json!(5));
        assert_eq!(to_json(&Value::String("x".into()), &[]), json!("x"));
    }

    #[test]
    fn renders_binary_as_hex() {
        let json = to_json(&Value::Binary(vec![0xde, 0xad]), &[]);
        assert_eq!(json, json!({ "$binary": "dead" }));
    }

    #[test]
    fn renders_object_with_resolved_field_names() {
        let class = Rc::new(ClassDefinition::new("p", vec!["n".into()]));
        let object = Value::Object(Rc::new(RefCell::new(ObjectData {
            class_def_id: 0,
            fields: vec![Value::String("x".into())],
        })));
        let json = to_json(&object, &[class]);
        assert_eq!(json, json!({ "$class": "p", "n": "x" }));
    }
}
