//! Envelope codec
//!
//! ```text
//! +-----------------+------------------------------------------------+
//! | 6b 38 73 00     | runtime.Unknown                                |
//! | "k8s\0" magic   |   1: typeMeta { 1: apiVersion, 2: kind }       |
//! |                 |   2: raw      (the object's own serialization) |
//! |                 |   3: contentEncoding                           |
//! |                 |   4: contentType                               |
//! +-----------------+------------------------------------------------+
//! ```
//!
//! Decode keeps every message at the wire level. Encode only rebuilds the
//! layers whose lifecycle fields changed; everything else is written back
//! exactly as it was read.

use std::borrow::Cow;

use super::errors::{CodecError, CodecResult};
use super::object::{DecodedObject, Lifecycle, ObjectIdentity, Timestamp};
use super::wire::{FieldValue, Message};
use crate::schema::{SchemaDescriptor, TypeIdentity};

/// Magic prefix of the typed binary envelope
pub const ENVELOPE_MAGIC: [u8; 4] = [0x6b, 0x38, 0x73, 0x00];

/// Stateless envelope codec; one instance serves a whole run
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    pub fn new() -> Self {
        Self
    }

    /// Decode an envelope into a fresh object.
    ///
    /// Fails with `MalformedEnvelope` on a bad prefix or broken structure and
    /// with `SchemaMismatch` if the envelope names another type.
    pub fn decode(
        &self,
        bytes: &[u8],
        descriptor: &SchemaDescriptor,
    ) -> CodecResult<DecodedObject> {
        let body = bytes.strip_prefix(&ENVELOPE_MAGIC[..]).ok_or_else(|| {
            CodecError::malformed_at(0, "Missing typed envelope magic prefix")
        })?;

        let layout = descriptor.envelope();
        let envelope = Message::decode(body).map_err(|e| e.offset_by(ENVELOPE_MAGIC.len()))?;

        let type_meta = envelope
            .get_message(layout.type_meta)?
            .ok_or_else(|| CodecError::malformed("Envelope has no type metadata"))?;
        let api_version = type_meta.get_string(layout.api_version)?.unwrap_or("");
        let kind = type_meta.get_string(layout.kind)?.unwrap_or("");
        if !descriptor.matches(api_version, kind) {
            return Err(CodecError::schema_mismatch(
                &descriptor.identity().to_string(),
                &format!("{}/{}", api_version, kind),
            ));
        }
        let type_identity = TypeIdentity::from_api_version(api_version, kind);

        let raw = envelope
            .get_bytes(layout.raw)?
            .ok_or_else(|| CodecError::malformed("Envelope has no object payload"))?;
        let object = Message::decode(raw)?;

        let metadata = object
            .get_message(descriptor.metadata_field())?
            .ok_or_else(|| CodecError::malformed("Object has no metadata"))?;

        let identity = read_identity(&metadata, descriptor)?;
        let lifecycle = read_lifecycle(&metadata, descriptor)?;

        Ok(DecodedObject::from_parts(
            type_identity,
            envelope,
            object,
            metadata,
            identity,
            lifecycle,
        ))
    }

    /// Encode an object back into an envelope.
    ///
    /// An unmodified object encodes to the exact bytes it was decoded from.
    pub fn encode(
        &self,
        object: &DecodedObject,
        descriptor: &SchemaDescriptor,
    ) -> CodecResult<Vec<u8>> {
        if object.type_identity() != descriptor.identity() {
            return Err(CodecError::schema_mismatch(
                &descriptor.identity().to_string(),
                &object.type_identity().to_string(),
            ));
        }

        let envelope = patched_envelope(object, descriptor)?;

        let len = ENVELOPE_MAGIC.len() + envelope.encoded_len();
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|e| CodecError::encoding(len, e))?;
        buf.extend_from_slice(&ENVELOPE_MAGIC);
        envelope.encode_into(&mut buf);
        Ok(buf)
    }
}

fn read_identity(metadata: &Message, descriptor: &SchemaDescriptor) -> CodecResult<ObjectIdentity> {
    let layout = descriptor.object_meta();
    let string = |number: u32| -> CodecResult<Option<String>> {
        Ok(metadata.get_string(number)?.map(str::to_string))
    };

    let creation_timestamp = match metadata.get_message(layout.creation_timestamp)? {
        Some(time) => Some(Timestamp::from_message(&time, descriptor.time())?),
        None => None,
    };

    Ok(ObjectIdentity {
        name: string(layout.name)?,
        namespace: string(layout.namespace)?,
        uid: string(layout.uid)?,
        resource_version: string(layout.resource_version)?,
        creation_timestamp,
    })
}

fn read_lifecycle(metadata: &Message, descriptor: &SchemaDescriptor) -> CodecResult<Lifecycle> {
    let layout = descriptor.object_meta();

    let deletion_timestamp = match metadata.get_message(layout.deletion_timestamp)? {
        Some(time) => Some(Timestamp::from_message(&time, descriptor.time())?),
        None => None,
    };
    let deletion_grace_period_seconds = metadata
        .get_varint(layout.deletion_grace_period_seconds)?
        .map(|v| v as i64);

    Ok(Lifecycle {
        deletion_timestamp,
        deletion_grace_period_seconds,
    })
}

/// Wrapper message with lifecycle changes applied.
///
/// Only fields whose value changed are touched, so untouched layers keep
/// their original bytes even if they contain repeated occurrences.
fn patched_envelope<'a>(
    object: &'a DecodedObject,
    descriptor: &SchemaDescriptor,
) -> CodecResult<Cow<'a, Message>> {
    if !object.is_modified() {
        return Ok(Cow::Borrowed(object.envelope_fields()));
    }

    let layout = descriptor.object_meta();
    let current = object.lifecycle();
    let decoded = object.decoded_lifecycle();

    let mut metadata = object.metadata_fields().clone();
    if current.deletion_timestamp != decoded.deletion_timestamp {
        match current.deletion_timestamp {
            Some(ts) => metadata.set_message(
                layout.deletion_timestamp,
                &ts.to_message(descriptor.time()),
            )?,
            None => {
                metadata.remove(layout.deletion_timestamp);
            }
        }
    }
    if current.deletion_grace_period_seconds != decoded.deletion_grace_period_seconds {
        match current.deletion_grace_period_seconds {
            Some(secs) => metadata.set(
                layout.deletion_grace_period_seconds,
                FieldValue::Varint(secs as u64),
            ),
            None => {
                metadata.remove(layout.deletion_grace_period_seconds);
            }
        }
    }

    let mut body = object.object_fields().clone();
    body.set_message(descriptor.metadata_field(), &metadata)?;

    let mut envelope = object.envelope_fields().clone();
    envelope.set_message(descriptor.envelope().raw, &body)?;

    Ok(Cow::Owned(envelope))
}
