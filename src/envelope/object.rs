//! Decoded resource objects
//!
//! A `DecodedObject` keeps the wrapper, the object and its `ObjectMeta` as
//! wire-level messages and exposes typed views of the handful of fields the
//! repair cares about. Only the two lifecycle fields are writable.

use std::fmt;

use chrono::{DateTime, Utc};

use super::wire::Message;
use crate::schema::{TimeLayout, TypeIdentity};

/// A `meta.v1.Time` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Seconds since the Unix epoch
    pub seconds: i64,
    /// Sub-second nanoseconds
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// UTC time, if the value is in chrono's range
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let nanos = u32::try_from(self.nanos).ok()?;
        DateTime::<Utc>::from_timestamp(self.seconds, nanos)
    }

    /// Parse from a `Time` message
    pub(crate) fn from_message(
        message: &Message,
        layout: &TimeLayout,
    ) -> super::CodecResult<Self> {
        let seconds = message.get_varint(layout.seconds)?.unwrap_or(0) as i64;
        let nanos = message.get_varint(layout.nanos)?.unwrap_or(0) as i64 as i32;
        Ok(Self { seconds, nanos })
    }

    /// Encode as a `Time` message; zero members are omitted
    pub(crate) fn to_message(&self, layout: &TimeLayout) -> Message {
        let mut message = Message::new();
        if self.seconds != 0 {
            message = message.with_varint(layout.seconds, self.seconds as u64);
        }
        if self.nanos != 0 {
            message = message.with_varint(layout.nanos, i64::from(self.nanos) as u64);
        }
        message
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos() as i32,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}s+{}ns", self.seconds, self.nanos),
        }
    }
}

/// Identity block of `ObjectMeta`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectIdentity {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub uid: Option<String>,
    pub resource_version: Option<String>,
    pub creation_timestamp: Option<Timestamp>,
}

/// The lifecycle fields the repair reads and clears
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifecycle {
    pub deletion_timestamp: Option<Timestamp>,
    pub deletion_grace_period_seconds: Option<i64>,
}

/// A resource object decoded from one envelope.
///
/// Every decode produces a new value; nothing carries over between records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedObject {
    type_identity: TypeIdentity,
    envelope: Message,
    object: Message,
    metadata: Message,
    identity: ObjectIdentity,
    decoded_lifecycle: Lifecycle,
    lifecycle: Lifecycle,
}

impl DecodedObject {
    pub(crate) fn from_parts(
        type_identity: TypeIdentity,
        envelope: Message,
        object: Message,
        metadata: Message,
        identity: ObjectIdentity,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            type_identity,
            envelope,
            object,
            metadata,
            identity,
            decoded_lifecycle: lifecycle,
            lifecycle,
        }
    }

    /// Type identity carried by the envelope
    pub fn type_identity(&self) -> &TypeIdentity {
        &self.type_identity
    }

    /// Name, namespace, uid, resource version and creation time
    pub fn identity(&self) -> &ObjectIdentity {
        &self.identity
    }

    /// Object name, or an empty string for nameless objects
    pub fn name(&self) -> &str {
        self.identity.name.as_deref().unwrap_or("")
    }

    pub fn deletion_timestamp(&self) -> Option<Timestamp> {
        self.lifecycle.deletion_timestamp
    }

    pub fn deletion_grace_period_seconds(&self) -> Option<i64> {
        self.lifecycle.deletion_grace_period_seconds
    }

    pub fn set_deletion_timestamp(&mut self, value: Option<Timestamp>) {
        self.lifecycle.deletion_timestamp = value;
    }

    pub fn set_deletion_grace_period_seconds(&mut self, value: Option<i64>) {
        self.lifecycle.deletion_grace_period_seconds = value;
    }

    /// True iff a deletion timestamp is present
    pub fn is_pending_deletion(&self) -> bool {
        self.lifecycle.deletion_timestamp.is_some()
    }

    /// True if a lifecycle field differs from what was decoded
    pub fn is_modified(&self) -> bool {
        self.lifecycle != self.decoded_lifecycle
    }

    /// Wrapper fields as decoded
    pub fn envelope_fields(&self) -> &Message {
        &self.envelope
    }

    /// Object fields as decoded, `metadata` still in its serialized form
    pub fn object_fields(&self) -> &Message {
        &self.object
    }

    /// `ObjectMeta` fields as decoded, before any lifecycle change is applied
    pub fn metadata_fields(&self) -> &Message {
        &self.metadata
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub(crate) fn decoded_lifecycle(&self) -> &Lifecycle {
        &self.decoded_lifecycle
    }
}
