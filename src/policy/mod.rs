//! Mutation policies
//!
//! A policy decides whether a decoded object needs repair and produces the
//! repaired object. Policies are pure: no I/O, no shared state.

use crate::envelope::DecodedObject;

/// Predicate-and-transform pair applied to every scanned object
pub trait MutationPolicy {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// True if `object` must be rewritten
    fn needs_repair(&self, object: &DecodedObject) -> bool;

    /// The repaired object. Only called when `needs_repair` returned true.
    fn repair(&self, object: DecodedObject) -> DecodedObject;
}

/// Clears a stuck deletion so the resource returns to its previous phase.
///
/// An object is stuck iff it carries a deletion timestamp. Repair drops the
/// timestamp and the grace period together and leaves everything else alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearPendingDeletion;

impl MutationPolicy for ClearPendingDeletion {
    fn name(&self) -> &'static str {
        "clear-pending-deletion"
    }

    fn needs_repair(&self, object: &DecodedObject) -> bool {
        object.deletion_timestamp().is_some()
    }

    fn repair(&self, mut object: DecodedObject) -> DecodedObject {
        object.set_deletion_timestamp(None);
        object.set_deletion_grace_period_seconds(None);
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{EnvelopeCodec, Message, Timestamp, ENVELOPE_MAGIC};
    use crate::schema::SchemaDescriptor;

    fn decode(metadata: Message) -> DecodedObject {
        let type_meta = Message::new()
            .with_string(1, "v1")
            .with_string(2, "PersistentVolume");
        let object = Message::new()
            .with_message(1, &metadata)
            .with_bytes(2, b"spec".to_vec());
        let wrapper = Message::new()
            .with_message(1, &type_meta)
            .with_message(2, &object);
        let mut bytes = ENVELOPE_MAGIC.to_vec();
        wrapper.encode_into(&mut bytes);
        EnvelopeCodec::new()
            .decode(&bytes, &SchemaDescriptor::persistent_volume())
            .unwrap()
    }

    fn terminating() -> DecodedObject {
        decode(
            Message::new()
                .with_string(1, "pv-1")
                .with_message(9, &Message::new().with_varint(1, 1_700_000_000))
                .with_varint(10, 30),
        )
    }

    #[test]
    fn test_predicate_follows_deletion_timestamp() {
        let policy = ClearPendingDeletion;
        assert!(policy.needs_repair(&terminating()));

        let healthy = decode(Message::new().with_string(1, "pv-2"));
        assert!(!policy.needs_repair(&healthy));
    }

    #[test]
    fn test_grace_period_alone_is_not_pending() {
        let obj = decode(Message::new().with_string(1, "pv-3").with_varint(10, 30));
        assert!(!ClearPendingDeletion.needs_repair(&obj));
    }

    #[test]
    fn test_zero_timestamp_still_counts_as_present() {
        // an empty Time message is a present, zero-valued timestamp
        let obj = decode(Message::new().with_string(1, "pv-4").with_message(9, &Message::new()));
        assert_eq!(obj.deletion_timestamp(), Some(Timestamp::new(0, 0)));
        assert!(ClearPendingDeletion.needs_repair(&obj));
    }

    #[test]
    fn test_repair_clears_both_fields_only() {
        let policy = ClearPendingDeletion;
        let original = terminating();
        let repaired = policy.repair(original.clone());

        assert_eq!(repaired.deletion_timestamp(), None);
        assert_eq!(repaired.deletion_grace_period_seconds(), None);
        assert_eq!(repaired.identity(), original.identity());
        assert_eq!(repaired.type_identity(), original.type_identity());
        assert_eq!(repaired.object_fields(), original.object_fields());
        assert_eq!(repaired.metadata_fields(), original.metadata_fields());
        assert!(!policy.needs_repair(&repaired));
    }
}
