use crate::{
    node::{ColumnDescriptor, NodeError},
    types::{BackendKind, CasingStyle, ColumnDataType, TimestampEvent},
};
use derive_more::Deref;
use serde::Serialize;
use std::collections::BTreeMap;

///
/// ColumnList
///
/// Declaration order is significant: it is the column display/select order.
///

#[derive(Clone, Debug, Default, Deref, Serialize)]
pub struct ColumnList(Vec<ColumnDescriptor>);

impl ColumnList {
    pub(crate) fn push(&mut self, column: ColumnDescriptor) {
        self.0.push(column);
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut ColumnDescriptor> {
        self.0.get_mut(index)
    }
}

impl<'a> IntoIterator for &'a ColumnList {
    type Item = &'a ColumnDescriptor;
    type IntoIter = std::slice::Iter<'a, ColumnDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

///
/// ColumnRef
///
/// Where a mapped name points inside the descriptor.
///

#[derive(Clone, Copy, Debug, Serialize)]
enum ColumnRef {
    PrimaryKey,
    Column(usize),
}

///
/// EntityDescriptor
///
/// Compiled metadata for one entity type. Built once through the registry
/// builder, immutable after `is_entity` is set, read concurrently thereafter.
///

#[derive(Clone, Debug, Serialize)]
pub struct EntityDescriptor {
    pub name: String,
    pub table_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    pub is_entity: bool,
    pub casing: CasingStyle,
    pub source: BackendKind,
    pub cache: Vec<BackendKind>,

    pub(crate) primary_key: Option<ColumnDescriptor>,
    pub columns: ColumnList,

    map: BTreeMap<String, ColumnRef>,
    pub(crate) timestamps: [Vec<ColumnDescriptor>; TimestampEvent::COUNT],
    pub(crate) connection_names: BTreeMap<BackendKind, String>,
}

impl EntityDescriptor {
    #[must_use]
    pub(crate) fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            schema: None,
            parent: None,
            is_entity: false,
            casing: CasingStyle::Camel,
            source: BackendKind::Unspecified,
            cache: Vec::new(),
            primary_key: None,
            columns: ColumnList::default(),
            map: BTreeMap::new(),
            timestamps: [Vec::new(), Vec::new(), Vec::new()],
            connection_names: BTreeMap::new(),
        }
    }

    pub fn primary_key(&self) -> Result<&ColumnDescriptor, NodeError> {
        self.primary_key.as_ref().ok_or(NodeError::MissingPrimaryKey {
            entity: self.name.clone(),
        })
    }

    pub fn primary_key_name(&self, casing: CasingStyle) -> Result<String, NodeError> {
        Ok(casing.apply(&self.primary_key()?.name))
    }

    /// Case-insensitive column lookup over the primary key and every column.
    pub fn from_map(&self, name: &str) -> Result<&ColumnDescriptor, NodeError> {
        let slot = self.map.get(&name.to_lowercase()).copied();

        match slot {
            Some(ColumnRef::PrimaryKey) => self.primary_key(),
            Some(ColumnRef::Column(index)) => Ok(&self.columns[index]),
            None => Err(NodeError::UnknownColumn {
                name: name.to_owned(),
            }),
        }
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_lowercase())
    }

    /// Column names in declaration order, cased, minus the given data types.
    #[must_use]
    pub fn column_names(&self, casing: CasingStyle, exclude: &[ColumnDataType]) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| !exclude.contains(&column.ty))
            .map(|column| casing.apply(&column.name))
            .collect()
    }

    #[must_use]
    pub fn timestamps(&self, event: TimestampEvent) -> &[ColumnDescriptor] {
        &self.timestamps[event.index()]
    }

    /// Connection for a backend, falling back to the `Unspecified` default.
    #[must_use]
    pub fn connection_name(&self, backend: BackendKind) -> Option<&str> {
        self.connection_names
            .get(&backend)
            .or_else(|| self.connection_names.get(&BackendKind::Unspecified))
            .map(String::as_str)
    }

    pub(crate) fn set_primary_key(&mut self, column: ColumnDescriptor) {
        self.map
            .insert(column.name.to_lowercase(), ColumnRef::PrimaryKey);
        self.primary_key = Some(column);
    }

    pub(crate) fn add_column(&mut self, column: ColumnDescriptor) {
        self.map
            .insert(column.name.to_lowercase(), ColumnRef::Column(self.columns.len()));
        self.columns.push(column);
    }

    pub(crate) fn from_map_mut(&mut self, name: &str) -> Result<&mut ColumnDescriptor, NodeError> {
        let slot = self.map.get(&name.to_lowercase()).copied();

        match slot {
            Some(ColumnRef::PrimaryKey) => {
                self.primary_key
                    .as_mut()
                    .ok_or(NodeError::MissingPrimaryKey {
                        entity: self.name.clone(),
                    })
            }
            Some(ColumnRef::Column(index)) => Ok(self
                .columns
                .get_mut(index)
                .expect("column map points at a declared column")),
            None => Err(NodeError::UnknownColumn {
                name: name.to_owned(),
            }),
        }
    }
}
