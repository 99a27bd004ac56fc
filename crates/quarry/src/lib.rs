//! Quarry — one criteria model compiled into backend-native queries.
//!
//! This is the public meta-crate. Downstream users depend on **quarry** only.
//!
//! It re-exports the stable public API from:
//!   - `quarry-schema` (entity metadata registry)
//!   - `quarry-core`   (criteria model, settings, compilers)

pub use quarry_core as core;
pub use quarry_schema as schema;

pub use quarry_core::Error;

///
/// Prelude
///

pub mod prelude {
    pub use quarry_core::prelude::*;
}
