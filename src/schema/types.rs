//! Type identity and field layouts
//!
//! Field numbers follow the generated protobuf definitions of the
//! Kubernetes API (`k8s.io/apimachinery` and `k8s.io/api/core/v1`).

use std::fmt;

/// Group/version/kind identity of a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeIdentity {
    /// API group, empty for the core group
    pub group: String,
    /// API version within the group
    pub version: String,
    /// Resource kind
    pub kind: String,
}

impl TypeIdentity {
    /// Create a new identity
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Build an identity from the `apiVersion` and `kind` strings found in an
    /// envelope. `v1` means the core group; `apps/v1` splits on the slash.
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        match api_version.split_once('/') {
            Some((group, version)) => Self::new(group, version, kind),
            None => Self::new("", api_version, kind),
        }
    }

    /// The `apiVersion` string as written into an envelope
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}

/// Field numbers of the `runtime.Unknown` wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeLayout {
    /// `TypeMeta` sub-message
    pub type_meta: u32,
    /// Serialized object bytes
    pub raw: u32,
    /// `apiVersion` inside `TypeMeta`
    pub api_version: u32,
    /// `kind` inside `TypeMeta`
    pub kind: u32,
}

impl Default for EnvelopeLayout {
    fn default() -> Self {
        Self {
            type_meta: 1,
            raw: 2,
            api_version: 1,
            kind: 2,
        }
    }
}

/// Field numbers of `ObjectMeta` that are read or written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMetaLayout {
    pub name: u32,
    pub namespace: u32,
    pub uid: u32,
    pub resource_version: u32,
    pub creation_timestamp: u32,
    pub deletion_timestamp: u32,
    pub deletion_grace_period_seconds: u32,
}

impl Default for ObjectMetaLayout {
    fn default() -> Self {
        Self {
            name: 1,
            namespace: 3,
            uid: 5,
            resource_version: 6,
            creation_timestamp: 8,
            deletion_timestamp: 9,
            deletion_grace_period_seconds: 10,
        }
    }
}

/// Field numbers of `meta.v1.Time`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLayout {
    pub seconds: u32,
    pub nanos: u32,
}

impl Default for TimeLayout {
    fn default() -> Self {
        Self { seconds: 1, nanos: 2 }
    }
}
