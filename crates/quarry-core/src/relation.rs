use crate::error::CompileError;
use quarry_schema::{
    node::{ColumnDescriptor, EntityDescriptor},
    types::CasingStyle,
};

///
/// Relation resolution shared by both compilers.
///
/// The owning side is found by scanning a descriptor's columns for one whose
/// `relates_to` names the other entity *and* whose lower-cased column name
/// matches the other entity's name — the name check disambiguates self-joins
/// and multiple relations to the same type.
///

///
/// RelationSide
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelationSide {
    /// The parent entity carries the foreign-key column.
    Parent,
    /// The joined entity carries the inverse foreign-key column.
    Joined,
}

///
/// RelationEdge
///

#[derive(Clone, Debug)]
pub struct RelationEdge {
    pub side: RelationSide,
    pub column: ColumnDescriptor,
}

/// Physical foreign-key column for a relation edge: kebab-joined relation
/// column and target primary key, cased later by the caller.
pub(crate) fn foreign_key_name(column: &str, primary_key: &str) -> String {
    format!("{}-{}", CasingStyle::Kebab.apply(column), primary_key)
}

fn matching_column<'a>(
    owner: &'a EntityDescriptor,
    target: &EntityDescriptor,
) -> Option<&'a ColumnDescriptor> {
    let target_name = target.name.to_lowercase();

    owner.columns.iter().find(|column| {
        column.relates_to.as_deref() == Some(target.name.as_str())
            && column.name.to_lowercase() == target_name
    })
}

/// Resolve the relation between a parent and a joined entity, trying the
/// owning side first and the inverse side second.
pub fn resolve_relation(
    parent: &EntityDescriptor,
    joined: &EntityDescriptor,
) -> Result<RelationEdge, CompileError> {
    if let Some(column) = matching_column(parent, joined) {
        return Ok(RelationEdge {
            side: RelationSide::Parent,
            column: column.clone(),
        });
    }

    if let Some(column) = matching_column(joined, parent) {
        return Ok(RelationEdge {
            side: RelationSide::Joined,
            column: column.clone(),
        });
    }

    Err(CompileError::MissingRelation {
        left: parent.name.clone(),
        right: joined.name.clone(),
    })
}
