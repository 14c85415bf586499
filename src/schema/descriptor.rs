//! Schema descriptor for the one resource kind a run handles

use super::types::{EnvelopeLayout, ObjectMetaLayout, TimeLayout, TypeIdentity};

/// Read-only mapping from a type identity to the field layout the codec
/// decodes into.
///
/// Built once before the run and passed by reference to everything that
/// needs it. There is no registry and no way to mutate a descriptor after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    identity: TypeIdentity,
    envelope: EnvelopeLayout,
    metadata_field: u32,
    object_meta: ObjectMetaLayout,
    time: TimeLayout,
}

impl SchemaDescriptor {
    /// Descriptor for an arbitrary kind that embeds a standard `ObjectMeta`
    /// at `metadata_field`
    pub fn new(identity: TypeIdentity, metadata_field: u32) -> Self {
        Self {
            identity,
            envelope: EnvelopeLayout::default(),
            metadata_field,
            object_meta: ObjectMetaLayout::default(),
            time: TimeLayout::default(),
        }
    }

    /// core/v1 PersistentVolume
    pub fn persistent_volume() -> Self {
        Self::new(TypeIdentity::new("", "v1", "PersistentVolume"), 1)
    }

    pub fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    pub fn envelope(&self) -> &EnvelopeLayout {
        &self.envelope
    }

    /// Field number of `metadata` inside the object
    pub fn metadata_field(&self) -> u32 {
        self.metadata_field
    }

    pub fn object_meta(&self) -> &ObjectMetaLayout {
        &self.object_meta
    }

    pub fn time(&self) -> &TimeLayout {
        &self.time
    }

    /// True if an envelope's `apiVersion`/`kind` names this descriptor's type
    pub fn matches(&self, api_version: &str, kind: &str) -> bool {
        TypeIdentity::from_api_version(api_version, kind) == self.identity
    }
}
