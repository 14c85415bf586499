//! Schema descriptors
//!
//! A descriptor ties a group/version/kind identity to the protobuf field
//! numbers the envelope codec needs. One descriptor is built at startup and
//! shared read-only for the whole run.

mod descriptor;
mod types;

pub use descriptor::SchemaDescriptor;
pub use types::{EnvelopeLayout, ObjectMetaLayout, TimeLayout, TypeIdentity};
