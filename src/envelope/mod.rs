//! Typed binary envelope codec
//!
//! Decodes the protobuf envelopes a Kubernetes API server stores in its
//! key-value backend and encodes them back without losing anything it does
//! not model.
//!
//! # Guarantees
//!
//! - `encode(decode(b)) == b` for every envelope `b` that decodes
//! - Unknown fields keep their value and position
//! - Decode never reuses state from an earlier call

mod codec;
mod errors;
mod object;
pub mod wire;

pub use codec::{EnvelopeCodec, ENVELOPE_MAGIC};
pub use errors::{CodecError, CodecErrorCode, CodecResult};
pub use object::{DecodedObject, Lifecycle, ObjectIdentity, Timestamp};
pub use wire::{Field, FieldValue, Message};
