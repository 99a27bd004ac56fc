#[cfg(test)]
mod tests;

use crate::{
    node::{ColumnDescriptor, EntityDescriptor, NodeError},
    types::{BackendKind, BackendMask, CasingStyle, ColumnDataType, KeyGenerator, TimestampEvent},
};
use std::{
    collections::BTreeMap,
    sync::{Arc, LazyLock, RwLock},
};
use thiserror::Error as ThisError;

///
/// BuildError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum BuildError {
    #[error("entity '{name}' has already been registered")]
    DuplicateDeclaration { name: String },

    #[error("parent entity '{parent}' has not been registered")]
    MissingParent { parent: String },

    #[error(transparent)]
    Node(#[from] NodeError),
}

///
/// EntityBuilder
///
/// Explicit, load-time declaration surface. Builder methods that reference a
/// previously declared column fail fast with `UnknownColumn`; `register`
/// finalizes the descriptor and makes it immutable.
///

#[derive(Debug)]
pub struct EntityBuilder {
    descriptor: EntityDescriptor,
}

impl EntityBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            descriptor: EntityDescriptor::new(name, table_name),
        }
    }

    #[must_use]
    pub fn schema(mut self, name: impl Into<String>) -> Self {
        self.descriptor.schema = Some(name.into());
        self
    }

    /// Casing of the entity's own in-memory field names.
    #[must_use]
    pub fn casing(mut self, casing: CasingStyle) -> Self {
        self.descriptor.casing = casing;
        self
    }

    #[must_use]
    pub fn primary_key(mut self, column: ColumnDescriptor) -> Self {
        self.descriptor.set_primary_key(column);
        self
    }

    #[must_use]
    pub fn column(mut self, mut column: ColumnDescriptor) -> Self {
        column.order = u32::try_from(self.descriptor.columns.len()).unwrap_or(u32::MAX);
        self.descriptor.add_column(column);
        self
    }

    /// Declare a relation edge from a column to another entity type. The
    /// target is resolved by name at compile time, so cyclic relations can be
    /// declared in either order.
    pub fn relation(mut self, column: &str, target: impl Into<String>) -> Result<Self, BuildError> {
        let column = self.descriptor.from_map_mut(column)?;

        column.relates_to = Some(target.into());
        if column.ty == ColumnDataType::Undetermined {
            column.ty = ColumnDataType::Entity;
        }

        Ok(self)
    }

    pub fn index(mut self, column: &str, index_name: impl Into<String>) -> Result<Self, BuildError> {
        self.descriptor.from_map_mut(column)?.index_name = Some(index_name.into());
        Ok(self)
    }

    pub fn generator(mut self, column: &str, generator: KeyGenerator) -> Result<Self, BuildError> {
        self.descriptor.from_map_mut(column)?.generator = generator;
        Ok(self)
    }

    /// Drop the column from the given backends.
    pub fn exclusions(mut self, column: &str, backends: &[BackendKind]) -> Result<Self, BuildError> {
        self.descriptor.from_map_mut(column)?.exclusions =
            backends.iter().copied().collect::<BackendMask>();
        Ok(self)
    }

    /// Keep the column only on the given backends.
    pub fn only(mut self, column: &str, backends: &[BackendKind]) -> Result<Self, BuildError> {
        self.descriptor.from_map_mut(column)?.exclusions =
            BackendMask::supported_except(backends);
        Ok(self)
    }

    pub fn order(mut self, column: &str, order: u32) -> Result<Self, BuildError> {
        self.descriptor.from_map_mut(column)?.order = order;
        Ok(self)
    }

    pub fn data_type(mut self, column: &str, ty: ColumnDataType) -> Result<Self, BuildError> {
        self.descriptor.from_map_mut(column)?.ty = ty;
        Ok(self)
    }

    /// Stamp the named column on the matching write event.
    pub fn timestamp(mut self, column: &str, event: TimestampEvent) -> Result<Self, BuildError> {
        let stamped = self.descriptor.from_map(column)?.clone();

        self.descriptor.timestamps[event.index()].push(stamped);
        Ok(self)
    }

    /// The one backend this entity is authoritative in.
    #[must_use]
    pub fn source(mut self, backend: BackendKind) -> Self {
        self.descriptor.source = backend;
        self
    }

    /// Secondary backends consulted/written around the source, in order.
    #[must_use]
    pub fn cache(mut self, backends: &[BackendKind]) -> Self {
        self.descriptor.cache = backends.to_vec();
        self
    }

    #[must_use]
    pub fn connection(mut self, name: impl Into<String>, backend: BackendKind) -> Self {
        self.descriptor.connection_names.insert(backend, name.into());
        self
    }
}

///
/// Registry
///
/// Name-keyed table of finalized descriptors. Written once per entity at
/// declaration time, read concurrently afterwards. A process-wide instance is
/// available through `Registry::global`.
///

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

#[derive(Debug, Default)]
pub struct Registry {
    entities: RwLock<BTreeMap<String, Arc<EntityDescriptor>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    /// Finalize and store a descriptor. Re-declaring a registered name is a
    /// programming error, reported as `DuplicateDeclaration`.
    pub fn register(&self, builder: EntityBuilder) -> Result<Arc<EntityDescriptor>, BuildError> {
        let mut descriptor = builder.descriptor;
        let mut entities = self
            .entities
            .write()
            .expect("registry RwLock poisoned while acquiring write lock");

        if entities.contains_key(&descriptor.name) {
            return Err(BuildError::DuplicateDeclaration {
                name: descriptor.name,
            });
        }

        descriptor.is_entity = true;

        let descriptor = Arc::new(descriptor);
        entities.insert(descriptor.name.clone(), Arc::clone(&descriptor));

        Ok(descriptor)
    }

    /// Start a child declaration that deep-copies the parent's primary key,
    /// columns, timestamp buckets, casing, schema, and connection map. The
    /// copies are values: mutating the child never touches the parent.
    pub fn inherit(&self, name: impl Into<String>, parent: &str) -> Result<EntityBuilder, BuildError> {
        let parent_descriptor = self.get(parent).ok_or_else(|| BuildError::MissingParent {
            parent: parent.to_owned(),
        })?;

        let mut descriptor =
            EntityDescriptor::new(name, parent_descriptor.table_name.clone());

        descriptor.parent = Some(parent_descriptor.name.clone());
        descriptor.schema = parent_descriptor.schema.clone();
        descriptor.casing = parent_descriptor.casing;
        descriptor.source = parent_descriptor.source;
        descriptor.cache = parent_descriptor.cache.clone();
        descriptor.connection_names = parent_descriptor.connection_names.clone();

        if let Ok(primary_key) = parent_descriptor.primary_key() {
            descriptor.set_primary_key(primary_key.clone());
        }

        for column in &parent_descriptor.columns {
            descriptor.add_column(column.clone());
        }

        for (index, bucket) in parent_descriptor.timestamps.iter().enumerate() {
            descriptor.timestamps[index] = bucket.clone();
        }

        Ok(EntityBuilder { descriptor })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<EntityDescriptor>> {
        self.entities
            .read()
            .expect("registry RwLock poisoned while acquiring read lock")
            .get(name)
            .cloned()
    }

    pub fn expect(&self, name: &str) -> Result<Arc<EntityDescriptor>, NodeError> {
        self.get(name).ok_or_else(|| NodeError::UnknownEntity {
            name: name.to_owned(),
        })
    }

    #[must_use]
    pub fn is_entity(&self, name: &str) -> bool {
        self.get(name).is_some_and(|descriptor| descriptor.is_entity)
    }
}
