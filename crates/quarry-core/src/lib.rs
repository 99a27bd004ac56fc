pub mod config;
pub mod criteria;
pub mod error;
pub mod kv;
pub mod record;
pub mod relation;
pub mod settings;
pub mod sql;
pub mod value;

use crate::{config::ConfigError, error::CompileError};
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        config::{Configurations, ConnectionConfig},
        criteria::{
            Comparison, Criteria, CriteriaWhere, Evaluation, JoinKind, OrderParameter,
            SortDirection, WhereGroup, WhereValue,
        },
        error::CompileError,
        kv::{KeyValueQuery, KeyValueRequest},
        record::{Record, RecordMapper},
        settings::{DatabaseSettings, FlattenSettings},
        sql::{SqlBuilder, SqlQuery},
        value::Value,
    };
    pub use quarry_schema::prelude::*;
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    CompileError(#[from] CompileError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),
}
