//! The in-memory value model shared by the encoder and decoder.
//!
//! `Value` is an inert sum type: it carries no behavior beyond
//! construction and structural comparison. All of the hard engineering
//! -- tag dispatch, numeric ladders, reference tracking -- lives in
//! [`crate::decoder`] and [`crate::encoder`]; this module only describes
//! the shapes those two walk.

use std::cell::RefCell;
use std::rc::Rc;

/// A class definition: a nominal object type's name and declared field
/// order. Registered once per distinct class per top-level call, then
/// referenced by id from every instance of that class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    /// Fully-qualified class name as carried on the wire.
    pub class_name: String,
    /// Declared field names, in declaration order; attribute values on
    /// an instance line up with this order positionally.
    pub field_names: Vec<String>,
}

impl ClassDefinition {
    /// Creates a new class definition.
    pub fn new(class_name: impl Into<String>, field_names: Vec<String>) -> Self {
        Self {
            class_name: class_name.into(),
            field_names,
        }
    }
}

/// Backing storage for a [`Value::List`]. Held behind a handle so that
/// two positions in a value graph can share one list identity, and so
/// the decoder can hand back a reference to a list before its elements
/// have been decoded (self-referential composites).
#[derive(Debug, Default)]
pub struct ListData {
    /// Element values, in order.
    pub items: Vec<Value>,
    /// Optional type-name tolerated on decode (`'t'` prefix). The
    /// encoder never emits one; see the list encoding rules.
    pub type_name: Option<String>,
}

/// Shared handle to a [`ListData`]; cloning a `ListHandle` shares
/// identity rather than duplicating the list.
pub type ListHandle = Rc<RefCell<ListData>>;

/// Backing storage for [`Value::UntypedMap`] and the map half of
/// [`Value::TypedMap`]. Stored as an ordered sequence of pairs, not a
/// hash map, because Hessian map keys are arbitrary `Value`s (including
/// ones with no sensible `Hash` impl) and insertion order must survive
/// round-tripping.
#[derive(Debug, Default)]
pub struct MapData {
    /// Key/value pairs, in insertion order.
    pub entries: Vec<(Value, Value)>,
}

/// Shared handle to a [`MapData`].
pub type MapHandle = Rc<RefCell<MapData>>;

/// Backing storage for [`Value::Object`]: the class it instantiates and
/// its attribute values in declared field order.
#[derive(Debug)]
pub struct ObjectData {
    /// Id of this instance's class definition in the owning codec's
    /// class-definition table.
    pub class_def_id: u32,
    /// Attribute values, positionally aligned with the class's
    /// `field_names`.
    pub fields: Vec<Value>,
}

/// Shared handle to an [`ObjectData`].
pub type ObjectHandle = Rc<RefCell<ObjectData>>;

/// A decoded or to-be-encoded Hessian value.
///
/// Composite variants (`List`, `UntypedMap`, `TypedMap`, `Object`) hold a
/// shared handle rather than owning their children inline. That is what
/// lets the same list or object occupy two positions in a graph -- the
/// handles are `Rc::clone`s of each other -- and lets the decoder return
/// a handle to a composite before its children are decoded, so a
/// self-referential object can refer to itself mid-construction.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null value (`N`).
    Null,
    /// A boolean (`T`/`F`).
    Bool(bool),
    /// A 32-bit signed integer.
    Int(i32),
    /// A 64-bit signed integer.
    Long(i64),
    /// A 64-bit float, free to use any compact wire form that fits.
    Double(f64),
    /// A 64-bit float that must round-trip through the full 8-byte `D`
    /// tag even when a compact form would losslessly represent it, to
    /// preserve `float`/`double` typing across language boundaries.
    ForcedDouble(f64),
    /// UTC milliseconds since the Unix epoch.
    Date(i64),
    /// An opaque byte blob.
    Binary(Vec<u8>),
    /// A logical sequence of Unicode code points, wire-transported as
    /// UTF-8.
    String(String),
    /// An ordered, possibly self-referential sequence of values that
    /// participates in reference identity.
    List(ListHandle),
    /// An ordered key/value mapping with no nominal type, whose keys may
    /// be any `Value`.
    UntypedMap(MapHandle),
    /// An [`UntypedMap`](Value::UntypedMap)-shaped mapping carrying an
    /// additional nominal type label.
    TypedMap(String, MapHandle),
    /// An instance of a registered class.
    Object(ObjectHandle),
    /// A back-reference to a previously decoded `List`/`Map`/`Object`.
    /// Only ever produced by the decoder; the encoder resolves identity
    /// sharing itself and never hands one to a caller.
    Ref(u32),
}

impl Value {
    /// Convenience constructor for an untyped list from owned items.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(ListData {
            items,
            type_name: None,
        })))
    }

    /// Convenience constructor for an untyped map from owned pairs.
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::UntypedMap(Rc::new(RefCell::new(MapData { entries })))
    }

    /// Returns `true` if this variant is one the reference table tracks
    /// (composites only; primitives never participate in identity
    /// sharing).
    pub fn participates_in_ref_table(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::UntypedMap(_) | Value::TypedMap(_, _) | Value::Object(_)
        )
    }
}

/// A resolved, presentation-friendly view of an [`Value::Object`]: its
/// class name paired with its fields as a name/value map, in declared
/// field order.
///
/// This is deliberately outside the core `Value` enum -- building it
/// requires consulting a class-definition table the bare `Object`
/// variant doesn't carry -- and exists for collaborators such as a
/// debug printer that want to render an instance without re-deriving
/// field names themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    /// The instance's class name.
    pub class_name: String,
    /// Field name / value pairs, in declared field order.
    pub fields: Vec<(String, ValueSnapshot)>,
}

/// An owned, pointer-free snapshot of a [`Value`] suitable for storing in
/// an [`ObjectRecord`] or handing to a display layer without borrowing
/// from the original value graph.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSnapshot {
    /// See [`Value::Null`].
    Null,
    /// See [`Value::Bool`].
    Bool(bool),
    /// See [`Value::Int`].
    Int(i32),
    /// See [`Value::Long`].
    Long(i64),
    /// See [`Value::Double`] / [`Value::ForcedDouble`].
    Double(f64),
    /// See [`Value::Date`].
    Date(i64),
    /// See [`Value::Binary`].
    Binary(Vec<u8>),
    /// See [`Value::String`].
    String(String),
    /// A list snapshot.
    List(Vec<ValueSnapshot>),
    /// A map snapshot, optionally carrying a type label.
    Map(Option<String>, Vec<(ValueSnapshot, ValueSnapshot)>),
    /// A nested object snapshot.
    Object(Box<ObjectRecord>),
    /// An unresolved reference (the snapshot walk does not follow
    /// cycles).
    Ref(u32),
}

impl ValueSnapshot {
    /// Snapshots a `Value`, resolving `Object` variants against
    /// `classes` to recover field names. Cyclic graphs are snapshotted
    /// shallowly: a composite is only expanded the first time it is
    /// seen, and repeats degrade to their already-known shape being
    /// re-copied (the snapshot has no reference table of its own, since
    /// it is a display aid, not a wire format).
    pub fn from_value(value: &Value, classes: &[Rc<ClassDefinition>]) -> Self {
        match value {
            Value::Null => ValueSnapshot::Null,
            Value::Bool(b) => ValueSnapshot::Bool(*b),
            Value::Int(i) => ValueSnapshot::Int(*i),
            Value::Long(l) => ValueSnapshot::Long(*l),
            Value::Double(d) | Value::ForcedDouble(d) => ValueSnapshot::Double(*d),
            Value::Date(ms) => ValueSnapshot::Date(*ms),
            Value::Binary(b) => ValueSnapshot::Binary(b.clone()),
            Value::String(s) => ValueSnapshot::String(s.clone()),
            Value::List(handle) => {
                let data = handle.borrow();
                ValueSnapshot::List(
                    data.items
                        .iter()
                        .map(|v| ValueSnapshot::from_value(v, classes))
                        .collect(),
                )
            }
            Value::UntypedMap(handle) => {
                let data = handle.borrow();
                ValueSnapshot::Map(
                    None,
                    data.entries
                        .iter()
                        .map(|(k, v)| {
                            (
                                ValueSnapshot::from_value(k, classes),
                                ValueSnapshot::from_value(v, classes),
                            )
                        })
                        .collect(),
                )
            }
            Value::TypedMap(type_name, handle) => {
                let data = handle.borrow();
                ValueSnapshot::Map(
                    Some(type_name.clone()),
                    data.entries
                        .iter()
                        .map(|(k, v)| {
                            (
                                ValueSnapshot::from_value(k, classes),
                                ValueSnapshot::from_value(v, classes),
                            )
                        })
                        .collect(),
                )
            }
            Value::Object(handle) => {
                let data = handle.borrow();
                let class = classes.get(data.class_def_id as usize);
                let class_name = class
                    .map(|c| c.class_name.clone())
                    .unwrap_or_else(|| format!("<unknown class {}>", data.class_def_id));
                let field_names: Vec<String> = class
                    .map(|c| c.field_names.clone())
                    .unwrap_or_default();
                let fields = data
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let name = field_names
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("field{i}"));
                        (name, ValueSnapshot::from_value(v, classes))
                    })
                    .collect();
                ValueSnapshot::Object(Box::new(ObjectRecord { class_name, fields }))
            }
            Value::Ref(id) => ValueSnapshot::Ref(*id),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (ForcedDouble(a), ForcedDouble(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Binary(a), Binary(b)) => a == b,
            (String(a), String(b)) => a == b,
            (List(a), List(b)) => {
                Rc::ptr_eq(a, b) || a.borrow().items == b.borrow().items
            }
            (UntypedMap(a), UntypedMap(b)) => {
                Rc::ptr_eq(a, b) || a.borrow().entries == b.borrow().entries
            }
            (TypedMap(ta, a), TypedMap(tb, b)) => {
                ta == tb && (Rc::ptr_eq(a, b) || a.borrow().entries == b.borrow().entries)
            }
            (Object(a), Object(b)) => {
                Rc::ptr_eq(a, b) || {
                    let (a, b) = (a.borrow(), b.borrow());
                    a.class_def_id == b.class_def_id && a.fields == b.fields
                }
            }
            (Ref(a), Ref(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_list_handles_compare_equal_to_themselves() {
        let inner = Value::list(vec![]);
        let outer = Value::list(vec![inner.clone(), inner.clone()]);
        if let Value::List(handle) = &outer {
            assert_eq!(handle.borrow().items[0], handle.borrow().items[1]);
        } else {
            unreachable!()
        }
    }

    #[test]
    fn structurally_equal_but_distinct_lists_are_equal() {
        let a = Value::list(vec![Value::Int(1)]);
        let b = Value::list(vec![Value::Int(1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn object_snapshot_resolves_field_names() {
        let class = Rc::new(ClassDefinition::new("p", vec!["n".into(), "a".into()]));
        let object = Value::Object(Rc::new(RefCell::new(ObjectData {
            class_def_id: 0,
            fields: vec![Value::String("x".into()), Value::Int(20)],
        })));
        let snapshot = ValueSnapshot::from_value(&object, &[class]);
        match snapshot {
            ValueSnapshot::Object(record) => {
                assert_eq!(record.class_name, "p");
                assert_eq!(record.fields[0].0, "n");
                assert_eq!(record.fields[1].0, "a");
            }
            _ => unreachable!(),
        }
    }
}
