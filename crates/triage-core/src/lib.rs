pub mod error;
pub mod raw;
pub mod text;
pub mod time_util;
pub mod types;

pub use error::{Result, TriageError};
pub use types::*;

/// Current schema version for persisted artifacts (config, state, derived layer).
pub const SCHEMA_VERSION: u32 = 1;

/// Round half up toward +∞ (`-2.5` becomes `-2`, `2.5` becomes `3`).
pub fn round_score(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
