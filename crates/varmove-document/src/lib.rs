//! Document data model and host surface for varmove.
//!
//! This crate defines everything the migration engine knows about the host
//! document:
//!
//! - **Types**: collections, modes, variables, values (literal or alias),
//!   paints, and consumer bindings
//! - **Host trait**: the asynchronous collaborator surface the engine issues
//!   all document reads and writes against
//! - **Memory document**: a synthetic in-memory host for tests, with failure
//!   injection for the per-item failure paths

mod error;
mod host;
mod memory;
mod types;

pub use error::DocumentError;
pub use host::DocumentHost;
pub use memory::MemoryDocument;
pub use types::{
    Binding, Collection, CollectionId, ListProperty, Mode, ModeId, ModeValue, NodeId, PageId,
    Paint, PropertyBinding, ResolvedType, Value, Variable, VariableId,
};
