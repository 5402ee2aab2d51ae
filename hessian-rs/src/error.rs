//! Errors produced by the encoder and decoder.

/// All errors the codec can produce.
///
/// Every variant is fatal for the top-level `encode`/`decode` call that
/// produced it; the core never retries internally. Decode errors carry the
/// byte offset of the tag that triggered them so callers can locate the
/// offending position in the wire buffer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The decoder met a byte it has no dispatch rule for at the current
    /// position.
    #[error("unknown tag 0x{tag:02x} at offset {offset}")]
    UnknownTag {
        /// The offending leading byte.
        tag: u8,
        /// Byte offset of the tag within the input buffer.
        offset: usize,
    },

    /// Not enough bytes remained to complete the current decode step.
    #[error("truncated input at offset {offset}: needed {needed} more byte(s)")]
    TruncatedInput {
        /// Byte offset at which the read was attempted.
        offset: usize,
        /// Number of additional bytes that would have been required.
        needed: usize,
    },

    /// A string's UTF-8 byte walk encountered a lead byte outside
    /// `0x00..=0x7F` or `0xC0..=0xF7`.
    #[error("malformed UTF-8 lead byte 0x{lead:02x} at offset {offset}")]
    MalformedUtf8 {
        /// The offending lead byte.
        lead: u8,
        /// Byte offset of the lead byte.
        offset: usize,
    },

    /// A decoded `Ref` pointed past the current size of the back-reference
    /// table, or an encoder identity lookup produced an id greater than
    /// 65535.
    #[error("invalid reference id {id}")]
    InvalidReference {
        /// The offending reference id.
        id: u64,
    },

    /// An object instance cited a class-definition id that has not been
    /// registered yet.
    #[error("class definition {id} has not been registered")]
    ClassDefMissing {
        /// The missing class-definition id.
        id: u32,
    },

    /// An object instance supplied a different number of attribute values
    /// than its class declares fields.
    #[error("class '{class_name}' declares {expected} field(s), got {actual}")]
    FieldCountMismatch {
        /// Name of the class definition.
        class_name: String,
        /// Number of declared fields.
        expected: usize,
        /// Number of supplied values.
        actual: usize,
    },

    /// The encoder was asked to encode a `Value` variant it has no rule
    /// for (reserved for future variants; the current `Value` is total).
    #[error("no encoder rule for {0}")]
    EncoderTypeUnsupported(&'static str),

    /// A value does not fit any legal wire representation for its
    /// declared kind.
    #[error("numeric overflow while encoding {0}")]
    NumericOverflow(&'static str),

    /// Catch-all for malformed input that doesn't fit a more specific
    /// variant, e.g. a missing list/map terminator.
    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn truncated(offset: usize, needed: usize) -> Self {
        Self::TruncatedInput { offset, needed }
    }

    pub(crate) fn unknown_tag(tag: u8, offset: usize) -> Self {
        Self::UnknownTag { tag, offset }
    }
}
