mod column;
mod entity;

pub use column::ColumnDescriptor;
pub use entity::{ColumnList, EntityDescriptor};

use thiserror::Error as ThisError;

///
/// NodeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum NodeError {
    #[error("entity '{entity}' has no primary key")]
    MissingPrimaryKey { entity: String },

    #[error("unknown column: {name}")]
    UnknownColumn { name: String },

    #[error("unknown entity: {name}")]
    UnknownEntity { name: String },
}
