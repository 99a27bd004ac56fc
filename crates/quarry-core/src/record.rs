use crate::{error::CompileError, relation::foreign_key_name, value::Value};
use chrono::{DateTime, Utc};
use quarry_schema::{
    build::Registry,
    node::{ColumnDescriptor, EntityDescriptor},
    types::{BackendKind, CasingStyle, ColumnDataType, KeyGenerator, TimestampEvent},
};
use std::collections::BTreeMap;
use uuid::Uuid;

///
/// Record
///
/// A row/item as a name-to-value map. Source records carry the entity's own
/// field casing; mapped records carry the backend's column casing.
///

pub type Record = BTreeMap<String, Value>;

///
/// RecordMapper
///
/// Turns an entity-shaped source record into the backend-shaped record a
/// write path stores: cased column names, coerced values, excluded columns
/// dropped, nested entity values either recursed into (within the relation
/// depth) or collapsed onto the physical foreign-key column.
///

pub struct RecordMapper<'a> {
    registry: &'a Registry,
}

impl<'a> RecordMapper<'a> {
    #[must_use]
    pub const fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    pub fn database_record(
        &self,
        descriptor: &EntityDescriptor,
        source: &Record,
        casing: CasingStyle,
        backend: BackendKind,
        include_key: bool,
        relation_depth: u32,
    ) -> Result<Record, CompileError> {
        let mut record = if include_key {
            self.primary_key_record(descriptor, source, casing, true)?
        } else {
            Record::new()
        };

        for column in &descriptor.columns {
            if column.is_excluded(backend) {
                continue;
            }

            self.apply_column(
                descriptor,
                column,
                source,
                &mut record,
                casing,
                backend,
                relation_depth,
            )?;
        }

        Ok(record)
    }

    /// Record holding only the primary key. A missing key value is generated
    /// when `generate_key` is set and the column declares a Guid generator.
    pub fn primary_key_record(
        &self,
        descriptor: &EntityDescriptor,
        source: &Record,
        casing: CasingStyle,
        generate_key: bool,
    ) -> Result<Record, CompileError> {
        let primary_key = descriptor.primary_key()?;
        let target_name = casing.apply(&primary_key.name);
        let mut record = Record::new();

        match primary_key_value(descriptor, source)? {
            Some(value) => {
                record.insert(target_name, value.clone().coerce(primary_key.ty));
            }
            None if generate_key && primary_key.generator == KeyGenerator::Guid => {
                record.insert(target_name, Value::Guid(Uuid::new_v4()));
            }
            None => {}
        }

        Ok(record)
    }

    /// Stamp every column bound to the event. Timestamps address the record
    /// by raw column name and are truncated to whole seconds.
    pub fn update_timestamps(
        descriptor: &EntityDescriptor,
        record: &mut Record,
        event: TimestampEvent,
        now: DateTime<Utc>,
    ) {
        for column in descriptor.timestamps(event) {
            record.insert(
                column.name.clone(),
                Value::Date(now).coerce(ColumnDataType::Date),
            );
        }
    }

    fn apply_column(
        &self,
        descriptor: &EntityDescriptor,
        column: &ColumnDescriptor,
        source: &Record,
        record: &mut Record,
        casing: CasingStyle,
        backend: BackendKind,
        relation_depth: u32,
    ) -> Result<(), CompileError> {
        let source_name = descriptor.casing.apply(&column.name);
        let Some(value) = source.get(&source_name) else {
            return Ok(());
        };

        let target = match (column.ty, &column.relates_to) {
            (ColumnDataType::Entity, Some(target)) => self.registry.expect(target)?,
            _ => {
                record.insert(
                    casing.apply(&column.name),
                    value.clone().coerce(column.ty),
                );

                return Ok(());
            }
        };

        match value {
            Value::Record(nested) if relation_depth > 0 => {
                let nested_record = self.database_record(
                    &target,
                    nested,
                    casing,
                    backend,
                    true,
                    relation_depth - 1,
                )?;

                record.insert(casing.apply(&column.name), Value::Record(nested_record));
            }
            Value::Record(nested) => {
                // past the depth the nested value collapses onto the
                // physical foreign-key column
                let primary_key = target.primary_key()?;
                let key_value = nested
                    .get(&target.casing.apply(&primary_key.name))
                    .cloned()
                    .unwrap_or(Value::Null);

                record.insert(
                    casing.apply(&foreign_key_name(&column.name, &primary_key.name)),
                    key_value.coerce(primary_key.ty),
                );
            }
            scalar => {
                // a scalar relation value is the related key itself
                let primary_key = target.primary_key()?;

                record.insert(
                    casing.apply(&foreign_key_name(&column.name, &primary_key.name)),
                    scalar.clone().coerce(primary_key.ty),
                );
            }
        }

        Ok(())
    }
}

fn primary_key_value<'s>(
    descriptor: &EntityDescriptor,
    source: &'s Record,
) -> Result<Option<&'s Value>, CompileError> {
    let primary_key = descriptor.primary_key()?;

    Ok(source
        .get(&descriptor.casing.apply(&primary_key.name))
        .filter(|value| !value.is_null()))
}
