//! Configuration Resolver.
//!
//! Built-in defaults are an immutable value; caller layers are merged over
//! them field by field via [`merge_layer`], then normalized. Nothing in this
//! crate fails hard: bad layers are skipped and reported as warnings.

mod defaults;
mod load;
mod merge;
mod model;

pub use load::{load_config, ConfigLoad};
pub use merge::{merge_layer, merge_values, resolve, ListMerge, Resolved};
pub use model::*;
