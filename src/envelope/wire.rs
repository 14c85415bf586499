//! Field-preserving protobuf wire layer
//!
//! A `Message` is the ordered list of fields exactly as they appeared on the
//! wire. Nothing is interpreted unless a caller asks for it, so unknown
//! fields, repeated fields and field order all survive a decode/encode cycle.
//!
//! ```text
//! +-----------------------------+-------------------------------+
//! | key = (number << 3) | wire  | payload                       |
//! +-----------------------------+-------------------------------+
//!   wire 0: varint
//!   wire 1: 8 bytes little endian
//!   wire 2: varint length + bytes
//!   wire 5: 4 bytes little endian
//! ```
//!
//! Group wire types (3, 4) are rejected. Varints must be minimally encoded;
//! that is what makes `encode(decode(b)) == b` hold for every accepted `b`.

use super::errors::{CodecError, CodecResult};

/// Largest field number protobuf allows
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Protobuf wire types this layer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    fn from_tag(tag: u64) -> Option<Self> {
        match tag & 0x7 {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }

    fn bits(self) -> u64 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }
}

/// Payload of a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Varint(u64),
    Fixed64(u64),
    Bytes(Vec<u8>),
    Fixed32(u32),
}

impl FieldValue {
    /// Wire type this value is written with
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldValue::Varint(_) => WireType::Varint,
            FieldValue::Fixed64(_) => WireType::Fixed64,
            FieldValue::Bytes(_) => WireType::LengthDelimited,
            FieldValue::Fixed32(_) => WireType::Fixed32,
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            FieldValue::Varint(v) => varint_len(*v),
            FieldValue::Fixed64(_) => 8,
            FieldValue::Bytes(b) => varint_len(b.len() as u64) + b.len(),
            FieldValue::Fixed32(_) => 4,
        }
    }
}

/// One field occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub number: u32,
    pub value: FieldValue,
}

impl Field {
    fn key(&self) -> u64 {
        (u64::from(self.number) << 3) | self.value.wire_type().bits()
    }

    fn encoded_len(&self) -> usize {
        varint_len(self.key()) + self.value.payload_len()
    }
}

/// Number of bytes `value` takes as a varint
pub fn varint_len(value: u64) -> usize {
    // 7 payload bits per byte; zero still takes one byte
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Append `value` as a varint
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Read a minimally encoded varint at `*pos`, advancing past it
pub fn decode_varint(data: &[u8], pos: &mut usize) -> CodecResult<u64> {
    let start = *pos;
    let mut value: u64 = 0;

    for i in 0..10 {
        let byte = *data
            .get(start + i)
            .ok_or_else(|| CodecError::malformed_at(start, "Truncated varint"))?;

        if i == 9 && byte > 0x01 {
            return Err(CodecError::malformed_at(start, "Varint overflows 64 bits"));
        }

        value |= u64::from(byte & 0x7f) << (7 * i);

        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(CodecError::malformed_at(start, "Varint is not minimally encoded"));
            }
            *pos = start + i + 1;
            return Ok(value);
        }
    }

    Err(CodecError::malformed_at(start, "Varint longer than 10 bytes"))
}

fn take<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> CodecResult<&'a [u8]> {
    let start = *pos;
    let end = start
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            CodecError::malformed_at(
                start,
                format!("Field needs {} bytes, {} remain", len, data.len() - start),
            )
        })?;
    *pos = end;
    Ok(&data[start..end])
}

/// Ordered list of wire fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    fields: Vec<Field>,
}

impl Message {
    /// Create an empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every field of `data`
    pub fn decode(data: &[u8]) -> CodecResult<Self> {
        let mut fields = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            let field_start = pos;
            let key = decode_varint(data, &mut pos)?;

            let number = key >> 3;
            if number == 0 || number > u64::from(MAX_FIELD_NUMBER) {
                return Err(CodecError::malformed_at(
                    field_start,
                    format!("Invalid field number {}", number),
                ));
            }
            let wire_type = WireType::from_tag(key).ok_or_else(|| {
                CodecError::malformed_at(
                    field_start,
                    format!("Unsupported wire type {}", key & 0x7),
                )
            })?;

            let value = match wire_type {
                WireType::Varint => FieldValue::Varint(decode_varint(data, &mut pos)?),
                WireType::Fixed64 => {
                    let raw = take(data, &mut pos, 8)?;
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(raw);
                    FieldValue::Fixed64(u64::from_le_bytes(buf))
                }
                WireType::LengthDelimited => {
                    let len = decode_varint(data, &mut pos)?;
                    let len = usize::try_from(len).map_err(|_| {
                        CodecError::malformed_at(field_start, "Length does not fit in memory")
                    })?;
                    FieldValue::Bytes(take(data, &mut pos, len)?.to_vec())
                }
                WireType::Fixed32 => {
                    let raw = take(data, &mut pos, 4)?;
                    let mut buf = [0u8; 4];
                    buf.copy_from_slice(raw);
                    FieldValue::Fixed32(u32::from_le_bytes(buf))
                }
            };

            fields.push(Field {
                number: number as u32,
                value,
            });
        }

        Ok(Self { fields })
    }

    /// Exact number of bytes `encode_into` will append
    pub fn encoded_len(&self) -> usize {
        self.fields.iter().map(Field::encoded_len).sum()
    }

    /// Append the wire form of every field, in order
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        for field in &self.fields {
            encode_varint(field.key(), buf);
            match &field.value {
                FieldValue::Varint(v) => encode_varint(*v, buf),
                FieldValue::Fixed64(v) => buf.extend_from_slice(&v.to_le_bytes()),
                FieldValue::Bytes(b) => {
                    encode_varint(b.len() as u64, buf);
                    buf.extend_from_slice(b);
                }
                FieldValue::Fixed32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            }
        }
    }

    /// Encode into a freshly reserved buffer.
    ///
    /// Allocation failure is reported as an encoding error instead of aborting
    /// the process.
    pub fn encode_to_vec(&self) -> CodecResult<Vec<u8>> {
        let len = self.encoded_len();
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|e| CodecError::encoding(len, e))?;
        self.encode_into(&mut buf);
        Ok(buf)
    }

    /// All fields in wire order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the message has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value of `number`; the last occurrence wins, as for any singular field
    pub fn get(&self, number: u32) -> Option<&FieldValue> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.number == number)
            .map(|f| &f.value)
    }

    /// True if any occurrence of `number` is present
    pub fn contains(&self, number: u32) -> bool {
        self.fields.iter().any(|f| f.number == number)
    }

    /// Varint value of `number`
    pub fn get_varint(&self, number: u32) -> CodecResult<Option<u64>> {
        match self.get(number) {
            None => Ok(None),
            Some(FieldValue::Varint(v)) => Ok(Some(*v)),
            Some(other) => Err(wrong_wire_type(number, WireType::Varint, other)),
        }
    }

    /// Length-delimited payload of `number`
    pub fn get_bytes(&self, number: u32) -> CodecResult<Option<&[u8]>> {
        match self.get(number) {
            None => Ok(None),
            Some(FieldValue::Bytes(b)) => Ok(Some(b.as_slice())),
            Some(other) => Err(wrong_wire_type(number, WireType::LengthDelimited, other)),
        }
    }

    /// UTF-8 string payload of `number`
    pub fn get_string(&self, number: u32) -> CodecResult<Option<&str>> {
        match self.get_bytes(number)? {
            None => Ok(None),
            Some(b) => std::str::from_utf8(b)
                .map(Some)
                .map_err(|_| CodecError::malformed(format!("Field {} is not valid UTF-8", number))),
        }
    }

    /// Nested message stored in `number`.
    ///
    /// Repeated occurrences of a singular message field are merged the way a
    /// protobuf parser merges them: their payloads are concatenated and
    /// decoded as one message, so scalar members take the last value seen.
    pub fn get_message(&self, number: u32) -> CodecResult<Option<Message>> {
        let mut payloads = Vec::new();
        for field in self.fields.iter().filter(|f| f.number == number) {
            match &field.value {
                FieldValue::Bytes(b) => payloads.push(b.as_slice()),
                other => return Err(wrong_wire_type(number, WireType::LengthDelimited, other)),
            }
        }
        match payloads.as_slice() {
            [] => Ok(None),
            [single] => Message::decode(single).map(Some),
            many => Message::decode(&many.concat()).map(Some),
        }
    }

    /// Set a singular field.
    ///
    /// The first occurrence is replaced in place and any later occurrences are
    /// dropped. An absent field is inserted before the first field with a
    /// higher number, which is where a protobuf encoder would have put it.
    pub fn set(&mut self, number: u32, value: FieldValue) {
        if let Some(idx) = self.fields.iter().position(|f| f.number == number) {
            self.fields[idx].value = value;
            let mut seen = 0usize;
            self.fields.retain(|f| {
                if f.number != number {
                    return true;
                }
                seen += 1;
                seen == 1
            });
            return;
        }

        let idx = self
            .fields
            .iter()
            .position(|f| f.number > number)
            .unwrap_or(self.fields.len());
        self.fields.insert(idx, Field { number, value });
    }

    /// Set `number` to the encoding of `message`
    pub fn set_message(&mut self, number: u32, message: &Message) -> CodecResult<()> {
        self.set(number, FieldValue::Bytes(message.encode_to_vec()?));
        Ok(())
    }

    /// Remove every occurrence of `number`; returns whether anything was removed
    pub fn remove(&mut self, number: u32) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.number != number);
        self.fields.len() != before
    }

    /// Append a field without touching existing ones
    pub fn push(&mut self, number: u32, value: FieldValue) {
        self.fields.push(Field { number, value });
    }

    /// Builder: append a varint field
    pub fn with_varint(mut self, number: u32, value: u64) -> Self {
        self.push(number, FieldValue::Varint(value));
        self
    }

    /// Builder: append a length-delimited field
    pub fn with_bytes(mut self, number: u32, value: impl Into<Vec<u8>>) -> Self {
        self.push(number, FieldValue::Bytes(value.into()));
        self
    }

    /// Builder: append a string field
    pub fn with_string(self, number: u32, value: &str) -> Self {
        self.with_bytes(number, value.as_bytes())
    }

    /// Builder: append a nested message field
    pub fn with_message(mut self, number: u32, message: &Message) -> Self {
        let mut buf = Vec::with_capacity(message.encoded_len());
        message.encode_into(&mut buf);
        self.push(number, FieldValue::Bytes(buf));
        self
    }

    /// Builder: append a fixed 32-bit field
    pub fn with_fixed32(mut self, number: u32, value: u32) -> Self {
        self.push(number, FieldValue::Fixed32(value));
        self
    }

    /// Builder: append a fixed 64-bit field
    pub fn with_fixed64(mut self, number: u32, value: u64) -> Self {
        self.push(number, FieldValue::Fixed64(value));
        self
    }
}

fn wrong_wire_type(number: u32, expected: WireType, found: &FieldValue) -> CodecError {
    CodecError::malformed(format!(
        "Field {} has wire type {:?}, expected {:?}",
        number,
        found.wire_type(),
        expected
    ))
}
