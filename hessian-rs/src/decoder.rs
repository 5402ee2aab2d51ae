//! The decode half of the codec: bytes in, [`Value`] out.
//!
//! [`Decoder`] is a recursive-descent walk driven by the leading tag at
//! the current position (see [`crate::tags`]). It owns two tables scoped
//! to a single top-level call: the back-reference table (already
//! materialized `List`/`Map`/`Object` values, indexed by first-encounter
//! order) and the class-definition table (registered by `'O'`). Both are
//! dropped with the `Decoder` once the call returns.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Error;
use crate::read::{Read, SliceReader};
use crate::tags::{self, Tag};
use crate::value::{
    ClassDefinition, ListData, ListHandle, MapData, MapHandle, ObjectData, ObjectHandle, Value,
};

/// Decodes a single top-level value from `bytes`.
///
/// Consumption starts at offset 0; trailing bytes after the first
/// complete value are not required to be consumed. Use
/// [`decode_with_offset`] if the caller needs to know how much of the
/// buffer was used.
pub fn decode(bytes: &[u8]) -> Result<Value, Error> {
    let mut decoder = Decoder::new(bytes);
    decoder.decode_value()
}

/// Like [`decode`], but also returns the offset one past the last byte
/// consumed by the top-level value.
pub fn decode_with_offset(bytes: &[u8]) -> Result<(Value, usize), Error> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode_value()?;
    Ok((value, decoder.reader.offset()))
}

/// A decoder instance. Create one, call [`Decoder::decode_value`] once
/// for the top-level value, then inspect [`Decoder::class_definitions`]
/// if the caller needs to resolve `Object` field names. Reusing a
/// `Decoder` across multiple top-level calls is not supported -- its
/// reference and class tables are meant to live for exactly one call.
#[derive(Debug)]
pub struct Decoder<'a> {
    reader: SliceReader<'a>,
    refs: Vec<Value>,
    type_refs: Vec<String>,
    class_defs: Vec<Rc<ClassDefinition>>,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over `bytes`, starting at offset 0.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: SliceReader::new(bytes),
            refs: Vec::new(),
            type_refs: Vec::new(),
            class_defs: Vec::new(),
        }
    }

    /// Class definitions registered so far, in first-encounter order.
    /// Index `i` is the class-definition id `i` refers to.
    pub fn class_definitions(&self) -> &[Rc<ClassDefinition>] {
        &self.class_defs
    }

    /// Decodes one value at the current position, recursing into any
    /// nested composites.
    pub fn decode_value(&mut self) -> Result<Value, Error> {
        let offset = self.reader.offset();
        let byte = self.reader.next()?;
        self.decode_tagged(byte, offset)
    }

    fn decode_tagged(&mut self, byte: u8, offset: usize) -> Result<Value, Error> {
        match byte {
            tags::INT_1B_LO..=tags::INT_1B_HI => {
                Ok(Value::Int(byte as i32 - tags::INT_1B_OFFSET))
            }
            tags::INT_2B_LO..=tags::INT_2B_HI => {
                let b1 = self.reader.next()? as i32;
                Ok(Value::Int(((byte as i32 - tags::INT_2B_OFFSET) << 8) + b1))
            }
            tags::INT_3B_LO..=tags::INT_3B_HI => {
                let [b1, b2] = self.reader.read_const_bytes::<2>()?;
                let v = ((byte as i32 - tags::INT_3B_OFFSET) << 16)
                    + ((b1 as i32) << 8)
                    + b2 as i32;
                Ok(Value::Int(v))
            }
            tags::LONG_1B_LO..=tags::LONG_1B_HI => {
                Ok(Value::Long(byte as i64 - tags::LONG_1B_OFFSET))
            }
            tags::LONG_2B_LO..=tags::LONG_2B_HI => {
                let b1 = self.reader.next()? as i64;
                Ok(Value::Long(
                    ((byte as i64 - tags::LONG_2B_OFFSET) << 8) + b1,
                ))
            }
            tags::LONG_3B_LO..=tags::LONG_3B_HI => {
                let [b1, b2] = self.reader.read_const_bytes::<2>()?;
                let v = ((byte as i64 - tags::LONG_3B_OFFSET) << 16)
                    + ((b1 as i64) << 8)
                    + b2 as i64;
                Ok(Value::Long(v))
            }
            tags::STRING_SHORT_LO..=tags::STRING_SHORT_HI => {
                let len = (byte - tags::STRING_SHORT_LO) as usize;
                Ok(Value::String(self.read_code_points(len)?))
            }
            tags::STRING_MED_LO..=tags::STRING_MED_HI => {
                let hi = (byte - tags::STRING_MED_LO) as usize;
                let lo = self.reader.next()? as usize;
                Ok(Value::String(self.read_code_points((hi << 8) | lo)?))
            }
            tags::BINARY_SHORT_LO..=tags::BINARY_SHORT_HI => {
                let len = (byte - tags::BINARY_SHORT_LO) as usize;
                Ok(Value::Binary(self.reader.read_bytes(len)?))
            }
            tags::BINARY_MED_LO..=tags::BINARY_MED_HI => {
                let hi = (byte - tags::BINARY_MED_LO) as usize;
                let lo = self.reader.next()? as usize;
                Ok(Value::Binary(self.reader.read_bytes((hi << 8) | lo)?))
            }
            tags::LIST_FIXED_UNTYPED_LO..=tags::LIST_FIXED_UNTYPED_HI => {
                let len = (byte - tags::LIST_FIXED_UNTYPED_LO) as usize;
                self.decode_list_body(None, len)
            }
            tags::DOUBLE_ZERO => Ok(Value::Double(0.0)),
            tags::DOUBLE_ONE => Ok(Value::Double(1.0)),
            tags::DOUBLE_BYTE => {
                let b = self.reader.next()? as i8;
                Ok(Value::Double(b as f64))
            }
            tags::DOUBLE_SHORT => {
                let bytes = self.reader.read_const_bytes::<2>()?;
                Ok(Value::Double(i16::from_be_bytes(bytes) as f64))
            }
            tags::DOUBLE_FLOAT => {
                let bytes = self.reader.read_const_bytes::<4>()?;
                Ok(Value::Double(f32::from_be_bytes(bytes) as f64))
            }
            tags::REF_1B => {
                let id = self.reader.next()? as u32;
                self.resolve_ref(id)
            }
            tags::REF_2B => {
                let bytes = self.reader.read_const_bytes::<2>()?;
                self.resolve_ref(u16::from_be_bytes(bytes) as u32)
            }
            other => match Tag::try_from(other).map_err(|_| Error::unknown_tag(other, offset))? {
                Tag::Null => Ok(Value::Null),
                Tag::True => Ok(Value::Bool(true)),
                Tag::False => Ok(Value::Bool(false)),
                Tag::Int | Tag::IntAliasW => self.decode_int_4byte().map(Value::Int),
                Tag::LongAsInt => self.decode_int_4byte().map(|v| Value::Long(v as i64)),
                Tag::Long => self.decode_long_8byte().map(Value::Long),
                Tag::Double => {
                    let bytes = self.reader.read_const_bytes::<8>()?;
                    Ok(Value::ForcedDouble(f64::from_be_bytes(bytes)))
                }
                Tag::Date => {
                    let bytes = self.reader.read_const_bytes::<8>()?;
                    Ok(Value::Date(i64::from_be_bytes(bytes)))
                }
                Tag::StringFinal => self.decode_chunked_string(true),
                Tag::StringChunk | Tag::StringChunkAliasR => self.decode_chunked_string(false),
                Tag::BinaryFinal => self.decode_chunked_binary(true),
                Tag::BinaryChunk | Tag::BinaryChunkAliasA => self.decode_chunked_binary(false),
                Tag::List => self.decode_list(),
                Tag::ListTypeRef => self.decode_list_type_ref(),
                Tag::UntypedMap => self.decode_untyped_map(),
                Tag::TypedMap => self.decode_typed_map(),
                Tag::ClassDef => self.decode_class_def_then_instance(),
                Tag::Object => self.decode_object_instance(),
                Tag::Ref => {
                    let id = self.decode_compact_int()?;
                    self.resolve_ref(u32::try_from(id).map_err(|_| Error::InvalidReference {
                        id: id as u64,
                    })?)
                }
                Tag::ListType | Tag::LengthShort | Tag::LengthLong | Tag::End => {
                    Err(Error::unknown_tag(other, offset))
                }
            },
        }
    }

    fn decode_int_4byte(&mut self) -> Result<i32, Error> {
        Ok(i32::from_be_bytes(self.reader.read_const_bytes::<4>()?))
    }

    fn decode_long_8byte(&mut self) -> Result<i64, Error> {
        Ok(i64::from_be_bytes(self.reader.read_const_bytes::<8>()?))
    }

    /// Decodes a compact-integer-encoded id (used for ref ids via `'Q'`,
    /// object field counts, class-def ids, and list type-ref indices).
    fn decode_compact_int(&mut self) -> Result<i64, Error> {
        match self.decode_value()? {
            Value::Int(i) => Ok(i as i64),
            Value::Long(l) => Ok(l),
            other => Err(Error::Message(format!(
                "expected a compact integer, found {other:?}"
            ))),
        }
    }

    fn decode_string_value(&mut self) -> Result<String, Error> {
        match self.decode_value()? {
            Value::String(s) => Ok(s),
            other => Err(Error::Message(format!(
                "expected a string, found {other:?}"
            ))),
        }
    }

    /// Walks `count` UTF-8 code points starting at the current position,
    /// using the lead byte of each to determine how many bytes it
    /// spans.
    fn read_code_points(&mut self, count: usize) -> Result<String, Error> {
        let mut bytes = Vec::new();
        for _ in 0..count {
            let lead_offset = self.reader.offset();
            let lead = self.reader.next()?;
            let extra = match lead {
                0x00..=0x7F => 0,
                0xC0..=0xDF => 1,
                0xE0..=0xEF => 2,
                0xF0..=0xF7 => 3,
                _ => {
                    return Err(Error::MalformedUtf8 {
                        lead,
                        offset: lead_offset,
                    })
                }
            };
            bytes.push(lead);
            for _ in 0..extra {
                bytes.push(self.reader.next()?);
            }
        }
        String::from_utf8(bytes).map_err(|e| Error::MalformedUtf8 {
            lead: e.as_bytes().first().copied().unwrap_or(0),
            offset: self.reader.offset(),
        })
    }

    fn decode_chunked_string(&mut self, is_final: bool) -> Result<Value, Error> {
        let len = u16::from_be_bytes(self.reader.read_const_bytes::<2>()?) as usize;
        let chunk = self.read_code_points(len)?;
        if is_final {
            return Ok(Value::String(chunk));
        }
        match self.decode_value()? {
            Value::String(rest) => Ok(Value::String(chunk + &rest)),
            other => Err(Error::Message(format!(
                "expected a string continuation chunk, found {other:?}"
            ))),
        }
    }

    fn decode_chunked_binary(&mut self, is_final: bool) -> Result<Value, Error> {
        let len = u16::from_be_bytes(self.reader.read_const_bytes::<2>()?) as usize;
        let chunk = self.reader.read_bytes(len)?;
        if is_final {
            return Ok(Value::Binary(chunk));
        }
        match self.decode_value()? {
            Value::Binary(rest) => {
                let mut out = chunk;
                out.extend(rest);
                Ok(Value::Binary(out))
            }
            other => Err(Error::Message(format!(
                "expected a binary continuation chunk, found {other:?}"
            ))),
        }
    }

    fn decode_list_length_prefix(&mut self) -> Result<usize, Error> {
        let offset = self.reader.offset();
        match self.reader.next()? {
            b'n' => Ok(self.reader.next()? as usize),
            b'l' => Ok(u32::from_be_bytes(self.reader.read_const_bytes::<4>()?) as usize),
            other => Err(Error::unknown_tag(other, offset)),
        }
    }

    fn expect_terminator(&mut self) -> Result<(), Error> {
        let offset = self.reader.offset();
        match self.reader.next()? {
            b'z' => Ok(()),
            other => Err(Error::unknown_tag(other, offset)),
        }
    }

    fn decode_list(&mut self) -> Result<Value, Error> {
        let mut type_name = None;
        if self.reader.peek()? == b't' {
            self.reader.next()?;
            let len = u16::from_be_bytes(self.reader.read_const_bytes::<2>()?) as usize;
            let raw = self.reader.read_bytes(len)?;
            let name = String::from_utf8(raw)
                .map_err(|_| Error::Message("malformed list type name".into()))?;
            self.type_refs.push(name.clone());
            type_name = Some(name);
        }
        let len = self.decode_list_length_prefix()?;
        let value = self.decode_list_body(type_name, len)?;
        self.expect_terminator()?;
        Ok(value)
    }

    /// `'v'`: a back-reference to a previously-seen type plus an
    /// explicit length and children. Unlike `'V'`, this form does not
    /// occupy a new ref-table slot of its own.
    fn decode_list_type_ref(&mut self) -> Result<Value, Error> {
        let type_idx = self.decode_compact_int()? as usize;
        let type_name = self.type_refs.get(type_idx).cloned();
        let len = self.decode_list_length_prefix()?;
        let value = self.decode_list_elements(type_name, len)?;
        self.expect_terminator()?;
        Ok(value)
    }

    /// Decodes `len` list elements, reserving a ref-table slot before any
    /// element is decoded so a self-referential element can point back
    /// at the list it lives in.
    fn decode_list_body(&mut self, type_name: Option<String>, len: usize) -> Result<Value, Error> {
        let handle: ListHandle = Rc::new(RefCell::new(ListData {
            items: Vec::with_capacity(len),
            type_name,
        }));
        self.refs.push(Value::List(handle.clone()));
        self.decode_list_items(&handle, len)?;
        Ok(Value::List(handle))
    }

    /// Decodes `len` list elements without reserving a ref-table slot,
    /// for list forms (`'v'`) that do not themselves participate in
    /// reference identity.
    fn decode_list_elements(&mut self, type_name: Option<String>, len: usize) -> Result<Value, Error> {
        let handle: ListHandle = Rc::new(RefCell::new(ListData {
            items: Vec::with_capacity(len),
            type_name,
        }));
        self.decode_list_items(&handle, len)?;
        Ok(Value::List(handle))
    }

    fn decode_list_items(&mut self, handle: &ListHandle, len: usize) -> Result<(), Error> {
        for _ in 0..len {
            let item = self.decode_value()?;
            handle.borrow_mut().items.push(item);
        }
        Ok(())
    }

    fn decode_map_entries(&mut self, handle: &MapHandle) -> Result<(), Error> {
        loop {
            if self.reader.peek()? == b'z' {
                self.reader.next()?;
                return Ok(());
            }
            let key = self.decode_value()?;
            let val = self.decode_value()?;
            handle.borrow_mut().entries.push((key, val));
        }
    }

    fn decode_untyped_map(&mut self) -> Result<Value, Error> {
        let handle: MapHandle = Rc::new(RefCell::new(MapData::default()));
        self.refs.push(Value::UntypedMap(handle.clone()));
        self.decode_map_entries(&handle)?;
        Ok(Value::UntypedMap(handle))
    }

    fn decode_typed_map(&mut self) -> Result<Value, Error> {
        let type_name = self.decode_string_value()?;
        let handle: MapHandle = Rc::new(RefCell::new(MapData::default()));
        self.refs.push(Value::TypedMap(type_name.clone(), handle.clone()));
        self.decode_map_entries(&handle)?;
        Ok(Value::TypedMap(type_name, handle))
    }

    fn decode_class_def_then_instance(&mut self) -> Result<Value, Error> {
        let class_name = self.decode_string_value()?;
        let field_count = self.decode_compact_int()?;
        let field_count = usize::try_from(field_count)
            .map_err(|_| Error::Message("negative field count".into()))?;
        let mut field_names = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            field_names.push(self.decode_string_value()?);
        }
        self.class_defs
            .push(Rc::new(ClassDefinition::new(class_name, field_names)));
        // The class definition is immediately followed by the instance
        // it describes.
        self.decode_value()
    }

    fn decode_object_instance(&mut self) -> Result<Value, Error> {
        let class_id = self.decode_compact_int()?;
        let class_id =
            u32::try_from(class_id).map_err(|_| Error::ClassDefMissing { id: u32::MAX })?;
        let class = self
            .class_defs
            .get(class_id as usize)
            .cloned()
            .ok_or(Error::ClassDefMissing { id: class_id })?;
        let handle: ObjectHandle = Rc::new(RefCell::new(ObjectData {
            class_def_id: class_id,
            fields: Vec::with_capacity(class.field_names.len()),
        }));
        self.refs.push(Value::Object(handle.clone()));
        for _ in 0..class.field_names.len() {
            let field = self.decode_value()?;
            handle.borrow_mut().fields.push(field);
        }
        Ok(Value::Object(handle))
    }

    fn resolve_ref(&self, id: u32) -> Result<Value, Error> {
        self.refs
            .get(id as usize)
            .cloned()
            .ok_or(Error::InvalidReference { id: id as u64 })
    }
}
