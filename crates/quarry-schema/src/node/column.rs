use crate::types::{BackendKind, BackendMask, ColumnDataType, KeyGenerator};
use serde::Serialize;

///
/// ColumnDescriptor
///
/// One declared column on an entity. Owned exclusively by its
/// `EntityDescriptor`; relation edges reference the target entity by name,
/// never by value, so cyclic relations stay finite.
///

#[derive(Clone, Debug, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ty: ColumnDataType,
    pub order: u32,
    pub exclusions: BackendMask,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relates_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    pub generator: KeyGenerator,
}

impl ColumnDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ColumnDataType) -> Self {
        Self {
            name: name.into(),
            ty,
            order: 0,
            exclusions: BackendMask::EMPTY,
            relates_to: None,
            index_name: None,
            generator: KeyGenerator::None,
        }
    }

    /// A column is excluded only from concrete backends; the zero mask bit of
    /// `Unspecified` would otherwise match every mask.
    #[must_use]
    pub const fn is_excluded(&self, backend: BackendKind) -> bool {
        !matches!(backend, BackendKind::Unspecified) && self.exclusions.contains(backend)
    }
}
