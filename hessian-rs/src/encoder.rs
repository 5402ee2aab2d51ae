//! The encode half of the codec: [`Value`] in, bytes out.
//!
//! [`Encoder`] walks a value graph and dispatches on the dynamic variant
//! of each node. Before it emits any composite it checks whether that
//! composite's identity (an `Rc` pointer, for `List`/`Map`/`Object`) has
//! already been emitted in this call; if so it writes a reference
//! instead of repeating the payload. Both the reference table and the
//! class-name-to-id index are scoped to one [`encode`] call.

use bytes::BufMut;

use crate::error::Error;
use crate::tags;
use crate::value::Value;

/// Encodes `value` into a fresh byte buffer.
pub fn encode(value: &Value) -> Result<Vec<u8>, Error> {
    let mut encoder = Encoder::new();
    encoder.encode_value(value)?;
    Ok(encoder.into_bytes())
}

/// An encoder instance, scoped to one top-level [`Encoder::encode_value`]
/// call. Create one, encode exactly one value, then call
/// [`Encoder::into_bytes`].
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
    /// Addresses of composites already emitted, in emit order; the
    /// position in this table is the composite's reference id.
    refs: Vec<usize>,
    /// Class definitions registered so far, in emit order; the position
    /// in this table is the class's id.
    class_index: Vec<(String, usize)>,
}

impl Encoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the encoder, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Encodes `value`, recursing into any nested composites.
    pub fn encode_value(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Null => {
                self.buf.put_u8(b'N');
                Ok(())
            }
            Value::Bool(true) => {
                self.buf.put_u8(b'T');
                Ok(())
            }
            Value::Bool(false) => {
                self.buf.put_u8(b'F');
                Ok(())
            }
            Value::Int(v) => self.encode_int(*v),
            Value::Long(v) => self.encode_long(*v),
            Value::Double(v) => self.encode_double(*v),
            Value::ForcedDouble(v) => self.encode_forced_double(*v),
            Value::Date(ms) => self.encode_date(*ms),
            Value::String(s) => self.encode_string(s),
            Value::Binary(b) => self.encode_binary(b),
            Value::List(handle) => {
                if let Some(id) = self.lookup_ref(addr_of_list(handle)) {
                    return self.encode_ref(id);
                }
                self.register_ref(addr_of_list(handle));
                let data = handle.borrow();
                self.buf.put_u8(b'V');
                self.encode_list_length(data.items.len())?;
                for item in &data.items {
                    self.encode_value(item)?;
                }
                self.buf.put_u8(b'z');
                Ok(())
            }
            Value::UntypedMap(handle) => {
                if let Some(id) = self.lookup_ref(addr_of_map(handle)) {
                    return self.encode_ref(id);
                }
                self.register_ref(addr_of_map(handle));
                self.buf.put_u8(b'H');
                let data = handle.borrow();
                for (k, v) in &data.entries {
                    self.encode_value(k)?;
                    self.encode_value(v)?;
                }
                self.buf.put_u8(b'z');
                Ok(())
            }
            Value::TypedMap(type_name, handle) => {
                if let Some(id) = self.lookup_ref(addr_of_map(handle)) {
                    return self.encode_ref(id);
                }
                self.register_ref(addr_of_map(handle));
                self.buf.put_u8(b'M');
                self.encode_string(type_name)?;
                let data = handle.borrow();
                for (k, v) in &data.entries {
                    self.encode_value(k)?;
                    self.encode_value(v)?;
                }
                self.buf.put_u8(b'z');
                Ok(())
            }
            Value::Object(handle) => {
                if let Some(id) = self.lookup_ref(addr_of_object(handle)) {
                    return self.encode_ref(id);
                }
                self.register_ref(addr_of_object(handle));
                let data = handle.borrow();
                let class_id = data.class_def_id;
                let (class_name, expected_fields) = self
                    .class_index
                    .get(class_id as usize)
                    .cloned()
                    .ok_or_else(|| {
                        Error::Message(format!(
                            "class definition {class_id} was not registered via \
                             Encoder::register_class before encoding an instance"
                        ))
                    })?;
                if expected_fields != data.fields.len() {
                    return Err(Error::FieldCountMismatch {
                        class_name,
                        expected: expected_fields,
                        actual: data.fields.len(),
                    });
                }
                self.buf.put_u8(b'o');
                self.encode_compact_uint(class_id)?;
                for field in &data.fields {
                    self.encode_value(field)?;
                }
                Ok(())
            }
            Value::Ref(id) => self.encode_ref(*id),
        }
    }

    /// Registers a class definition, emitting its `'O'` header exactly
    /// once. Must be called before encoding the first instance of a
    /// given `class_def_id`; subsequent instances reuse the id.
    pub fn register_class(
        &mut self,
        class_def_id: u32,
        class_name: &str,
        field_names: &[String],
    ) -> Result<(), Error> {
        if self.class_index_contains(class_def_id) {
            return Ok(());
        }
        if class_def_id as usize != self.class_index.len() {
            return Err(Error::Message(
                "class definitions must be registered in dense, first-encounter order".into(),
            ));
        }
        self.buf.put_u8(b'O');
        self.encode_string(class_name)?;
        self.encode_int(field_names.len() as i32)?;
        for name in field_names {
            self.encode_string(name)?;
        }
        self.class_index
            .push((class_name.to_string(), field_names.len()));
        Ok(())
    }

    fn class_index_contains(&self, id: u32) -> bool {
        (id as usize) < self.class_index.len()
    }

    fn lookup_ref(&self, addr: usize) -> Option<u32> {
        self.refs.iter().position(|a| *a == addr).map(|i| i as u32)
    }

    fn register_ref(&mut self, addr: usize) {
        self.refs.push(addr);
    }

    fn encode_ref(&mut self, id: u32) -> Result<(), Error> {
        if id <= u8::MAX as u32 {
            self.buf.put_u8(tags::REF_1B);
            self.buf.put_u8(id as u8);
            Ok(())
        } else if id <= u16::MAX as u32 {
            self.buf.put_u8(tags::REF_2B);
            self.buf.put_u16(id as u16);
            Ok(())
        } else {
            Err(Error::InvalidReference { id: id as u64 })
        }
    }

    fn encode_compact_uint(&mut self, v: u32) -> Result<(), Error> {
        self.encode_int(v as i32)
    }

    fn encode_int(&mut self, v: i32) -> Result<(), Error> {
        if (tags::INT_1B_ENCODE_LO..=tags::INT_1B_ENCODE_HI).contains(&v) {
            self.buf.put_u8((v + tags::INT_1B_OFFSET) as u8);
        } else if (tags::INT_2B_ENCODE_LO..=tags::INT_2B_ENCODE_HI).contains(&v) {
            self.buf
                .put_u8(((v >> 8) + tags::INT_2B_OFFSET) as u8);
            self.buf.put_u8((v & 0xff) as u8);
        } else if (tags::INT_3B_ENCODE_LO..=tags::INT_3B_ENCODE_HI).contains(&v) {
            self.buf
                .put_u8(((v >> 16) + tags::INT_3B_OFFSET) as u8);
            self.buf.put_u8(((v >> 8) & 0xff) as u8);
            self.buf.put_u8((v & 0xff) as u8);
        } else {
            self.buf.put_u8(b'I');
            self.buf.put_i32(v);
        }
        Ok(())
    }

    fn encode_long(&mut self, v: i64) -> Result<(), Error> {
        if (tags::LONG_1B_ENCODE_LO..=tags::LONG_1B_ENCODE_HI).contains(&v) {
            self.buf.put_u8((v + tags::LONG_1B_OFFSET) as u8);
        } else if (tags::LONG_2B_ENCODE_LO..=tags::LONG_2B_ENCODE_HI).contains(&v) {
            self.buf
                .put_u8(((v >> 8) + tags::LONG_2B_OFFSET) as u8);
            self.buf.put_u8((v & 0xff) as u8);
        } else if (tags::LONG_3B_ENCODE_LO..=tags::LONG_3B_ENCODE_HI).contains(&v) {
            self.buf
                .put_u8(((v >> 16) + tags::LONG_3B_OFFSET) as u8);
            self.buf.put_u8(((v >> 8) & 0xff) as u8);
            self.buf.put_u8((v & 0xff) as u8);
        } else if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
            self.buf.put_u8(b'Y');
            self.buf.put_i32(v as i32);
        } else {
            self.buf.put_u8(b'L');
            self.buf.put_i64(v);
        }
        Ok(())
    }

    fn encode_double(&mut self, v: f64) -> Result<(), Error> {
        if v == 0.0 {
            self.buf.put_u8(tags::DOUBLE_ZERO);
        } else if v == 1.0 {
            self.buf.put_u8(tags::DOUBLE_ONE);
        } else if is_whole(v) && (-128.0..=127.0).contains(&v) {
            self.buf.put_u8(tags::DOUBLE_BYTE);
            self.buf.put_i8(v as i8);
        } else if is_whole(v) && (-32768.0..=32767.0).contains(&v) {
            self.buf.put_u8(tags::DOUBLE_SHORT);
            self.buf.put_i16(v as i16);
        } else if fits_f32_losslessly(v) {
            self.buf.put_u8(tags::DOUBLE_FLOAT);
            self.buf.put_f32(v as f32);
        } else {
            self.buf.put_u8(b'D');
            self.buf.put_f64(v);
        }
        Ok(())
    }

    /// A `ForcedDouble` always round-trips through the full 8-byte tag,
    /// bypassing every compact form, to preserve `float`/`double`
    /// typing across language boundaries.
    fn encode_forced_double(&mut self, v: f64) -> Result<(), Error> {
        self.buf.put_u8(b'D');
        self.buf.put_f64(v);
        Ok(())
    }

    fn encode_date(&mut self, ms: i64) -> Result<(), Error> {
        self.buf.put_u8(b'd');
        self.buf.put_i64(ms);
        Ok(())
    }

    fn encode_string(&mut self, s: &str) -> Result<(), Error> {
        let code_points: Vec<char> = s.chars().collect();
        if code_points.len() <= 31 {
            self.buf.put_u8(tags::STRING_SHORT_LO + code_points.len() as u8);
            self.buf.extend_from_slice(s.as_bytes());
            return Ok(());
        }
        let mut remaining = &code_points[..];
        while remaining.len() > tags::CHUNK_MAX_LEN {
            let (head, tail) = remaining.split_at(tags::CHUNK_MAX_LEN);
            self.write_string_chunk(head, false);
            remaining = tail;
        }
        self.write_string_chunk(remaining, true);
        Ok(())
    }

    fn write_string_chunk(&mut self, chunk: &[char], is_final: bool) {
        self.buf.put_u8(if is_final { b'S' } else { b's' });
        self.buf.put_u16(chunk.len() as u16);
        for c in chunk {
            let mut tmp = [0u8; 4];
            self.buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
    }

    fn encode_binary(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.len() <= 15 {
            self.buf.put_u8(tags::BINARY_SHORT_LO + bytes.len() as u8);
            self.buf.extend_from_slice(bytes);
            return Ok(());
        }
        let mut remaining = bytes;
        while remaining.len() > tags::CHUNK_MAX_LEN {
            let (head, tail) = remaining.split_at(tags::CHUNK_MAX_LEN);
            self.write_binary_chunk(head, false);
            remaining = tail;
        }
        self.write_binary_chunk(remaining, true);
        Ok(())
    }

    fn write_binary_chunk(&mut self, chunk: &[u8], is_final: bool) {
        self.buf.put_u8(if is_final { b'B' } else { b'b' });
        self.buf.put_u16(chunk.len() as u16);
        self.buf.extend_from_slice(chunk);
    }

    fn encode_list_length(&mut self, len: usize) -> Result<(), Error> {
        if len <= u8::MAX as usize {
            self.buf.put_u8(b'n');
            self.buf.put_u8(len as u8);
        } else {
            let len =
                u32::try_from(len).map_err(|_| Error::NumericOverflow("list length"))?;
            self.buf.put_u8(b'l');
            self.buf.put_u32(len);
        }
        Ok(())
    }
}

fn is_whole(v: f64) -> bool {
    v.fract() == 0.0
}

fn fits_f32_losslessly(v: f64) -> bool {
    (v as f32) as f64 == v
}

fn addr_of_list(handle: &crate::value::ListHandle) -> usize {
    std::rc::Rc::as_ptr(handle) as *const () as usize
}

fn addr_of_map(handle: &crate::value::MapHandle) -> usize {
    std::rc::Rc::as_ptr(handle) as *const () as usize
}

fn addr_of_object(handle: &crate::value::ObjectHandle) -> usize {
    std::rc::Rc::as_ptr(handle) as *const () as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_compact_int_edges() {
        assert_eq!(encode(&Value::Int(0)).unwrap(), vec![0x90]);
        assert_eq!(encode(&Value::Int(-16)).unwrap(), vec![0x80]);
        assert_eq!(encode(&Value::Int(47)).unwrap(), vec![0xbf]);
        assert_eq!(encode(&Value::Int(48)).unwrap(), vec![0xc8, 0x30]);
    }

    #[test]
    fn encodes_compact_long_edges() {
        assert_eq!(encode(&Value::Long(0)).unwrap(), vec![0xe0]);
        assert_eq!(encode(&Value::Long(15)).unwrap(), vec![0xef]);
    }

    #[test]
    fn encodes_bool_and_null() {
        assert_eq!(encode(&Value::Bool(true)).unwrap(), vec![b'T']);
        assert_eq!(encode(&Value::Bool(false)).unwrap(), vec![b'F']);
        assert_eq!(encode(&Value::Null).unwrap(), vec![b'N']);
    }

    #[test]
    fn encodes_utf8_string_with_code_point_length() {
        let bytes = encode(&Value::String("中文".into())).unwrap();
        assert_eq!(
            bytes,
            vec![0x02, 0xe4, 0xb8, 0xad, 0xe6, 0x96, 0x87]
        );
    }

    #[test]
    fn encodes_list_with_terminator() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let bytes = encode(&list).unwrap();
        assert_eq!(bytes, vec![b'V', b'n', 0x02, 0x91, 0x92, b'z']);
    }

    #[test]
    fn shares_identity_via_reference() {
        let inner = Value::list(vec![]);
        let outer = Value::list(vec![inner.clone(), inner.clone()]);
        let bytes = encode(&outer).unwrap();
        // outer: V n 02 [inner: V n 00 z] [ref to id 1] z
        assert_eq!(
            bytes,
            vec![b'V', b'n', 0x02, b'V', b'n', 0x00, b'z', tags::REF_1B, 0x01, b'z']
        );
    }
}
