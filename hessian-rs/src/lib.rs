#![deny(missing_docs, missing_debug_implementations)]

//! A codec for the Hessian 2.0 binary serialization wire format.
//!
//! Hessian packs every value behind a single leading tag byte: small
//! integers and longs fold their value into the tag itself, strings and
//! binaries carry a length prefix (or split into chunks past 64KiB),
//! and lists/maps/objects can share identity across a value graph via a
//! back-reference table built up as the decoder walks. This crate
//! models that graph as [`Value`] and provides a [`Decoder`]/[`Encoder`]
//! pair to move between it and wire bytes.
//!
//! # Decoding
//!
//! ```
//! use hessian_rs::decode;
//!
//! let value = decode(&[0x90]).unwrap();
//! assert_eq!(value, hessian_rs::Value::Int(0));
//! ```
//!
//! # Encoding
//!
//! ```
//! use hessian_rs::{encode, Value};
//!
//! let bytes = encode(&Value::list(vec![Value::Int(1), Value::Int(2)])).unwrap();
//! assert_eq!(bytes, vec![b'V', b'n', 0x02, 0x91, 0x92, b'z']);
//! ```
//!
//! # Object field names
//!
//! A bare [`Value::Object`] only carries a class-definition id; resolve
//! it against [`Decoder::class_definitions`] to recover field names, or
//! build a [`ValueSnapshot`] for a presentation-ready view.
//!
//! # Non-goals
//!
//! This crate decodes and encodes values already delivered over some
//! transport. It does not implement the Hessian/Burlap RPC call
//! envelope, service dispatch, or any network transport -- callers
//! layer those concerns on top using the [`Value`] graph this crate
//! produces.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod read;
pub mod tags;
pub mod value;

pub use decoder::{decode, decode_with_offset, Decoder};
pub use encoder::{encode, Encoder};
pub use error::Error;
pub use value::{
    ClassDefinition, ListData, ListHandle, MapData, MapHandle, ObjectData, ObjectHandle,
    ObjectRecord, Value, ValueSnapshot,
};
