pub mod build;
pub mod node;
pub mod types;

use crate::{build::BuildError, node::NodeError};
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        build::{EntityBuilder, Registry},
        node::{ColumnDescriptor, ColumnList, EntityDescriptor},
        types::{
            BackendKind, BackendMask, CasingStyle, ColumnDataType, KeyGenerator, TimestampEvent,
        },
    };
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    BuildError(#[from] BuildError),

    #[error(transparent)]
    NodeError(#[from] NodeError),
}
