//! Run-to-run change tracking.
//!
//! Each run stores a [`StateSnapshot`] of per-item content hashes. The next
//! run diffs against it; without a snapshot it falls back to the previous
//! report's data dump.

mod delta;
mod snapshot;

#[cfg(test)]
mod test_support;

pub use delta::{delta_from_previous_dump, delta_from_state, find_latest_report_dir, Delta};
pub use snapshot::{item_hash, read_state, write_state, StateSnapshot};
