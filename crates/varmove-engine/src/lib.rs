//! Variable migration engine.
//!
//! Moves typed design variables between collections in a single document
//! while preserving every downstream reference:
//!
//! - **Inspector**: read-only queries over collections, variables, and modes
//! - **Duplicates**: partitions a candidate set into movable vs.
//!   name-colliding with the destination
//! - **Migrator**: the four-phase move: create shells, copy values with
//!   alias rewriting, rebind consumers, delete originals
//! - **Bindings**: locates every consumer reference to a set of variable
//!   identities across the node tree and repoints it
//!
//! The engine is best-effort forward: per-item failures become counters and
//! log entries, never aborted phases.

mod bindings;
mod duplicates;
mod inspector;
mod migrator;

pub use bindings::BindingRewriter;
pub use duplicates::{Partition, partition};
pub use inspector::{CollectionInspector, CollectionSummary, ModeSummary, type_label};
pub use migrator::{
    DeletionPolicy, Migration, MigrationOptions, MigrationPhase, MigrationReport,
};
