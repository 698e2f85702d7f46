//! Maintainer notes: one markdown file per issue or PR.
//!
//! The header block is shared between the tool and people. Machine-owned keys
//! are recomputed on every run; `agent_*` keys, `relationship_quality_final`
//! and anything unknown belong to the human and are carried forward. The body
//! below the header is never touched after creation.

mod front_matter;
mod index;
mod note;

#[cfg(test)]
mod test_support;

pub use front_matter::{format_number, parse_document, FrontMatter, FrontValue, PREFERRED_ORDER};
pub use index::{build_index, title_key, IndexItem};
pub use note::{apply_note_to_pr, merge_front_matter, note_path, sync_note, Note, NoteOutcome};
