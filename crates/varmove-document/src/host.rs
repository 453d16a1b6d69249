//! The document host collaborator surface.
//!
//! Everything the engine does against the live document goes through this
//! trait: enumeration, variable creation and mutation, page traversal, and
//! binding reads/writes. The document is shared mutable state owned by the
//! host with no lock discipline, so callers re-check existence by identity at
//! phase boundaries instead of holding object references across awaits. Substituting an in-memory implementation (see
//! [`MemoryDocument`](crate::MemoryDocument)) gives tests a synthetic
//! document.

use async_trait::async_trait;

use crate::error::DocumentError;
use crate::types::{
    Collection, CollectionId, ListProperty, ModeId, NodeId, PageId, Paint, PropertyBinding,
    ResolvedType, Value, Variable, VariableId,
};

/// Host surface consumed by the migration engine.
///
/// Every interaction is asynchronous and suspends the caller until the host
/// responds; the engine never issues two host calls concurrently.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// All variable collections in the document, in host order.
    async fn collections(&self) -> Vec<Collection>;

    /// Resolve a collection by identity. `None` if it no longer exists.
    async fn collection(&self, id: &CollectionId) -> Option<Collection>;

    /// Resolve a variable by identity. `None` if it no longer exists.
    async fn variable(&self, id: &VariableId) -> Option<Variable>;

    /// All variables owned by a collection, in member order. Empty when the
    /// collection is absent.
    async fn collection_variables(&self, id: &CollectionId) -> Vec<Variable>;

    /// Create a variable in `collection` with the given name and type.
    /// The host assigns the identity.
    async fn create_variable(
        &self,
        collection: &CollectionId,
        name: &str,
        resolved_type: ResolvedType,
    ) -> Result<VariableId, DocumentError>;

    /// Set a variable's description.
    async fn set_variable_description(
        &self,
        id: &VariableId,
        description: &str,
    ) -> Result<(), DocumentError>;

    /// Set a variable's hidden-from-publishing flag.
    async fn set_variable_hidden(
        &self,
        id: &VariableId,
        hidden: bool,
    ) -> Result<(), DocumentError>;

    /// Replace a variable's scope tag set.
    async fn set_variable_scopes(
        &self,
        id: &VariableId,
        scopes: &[String],
    ) -> Result<(), DocumentError>;

    /// Set one per-platform code syntax entry.
    async fn set_variable_code_syntax(
        &self,
        id: &VariableId,
        platform: &str,
        syntax: &str,
    ) -> Result<(), DocumentError>;

    /// Set a variable's value for one mode of its owning collection.
    async fn set_variable_value(
        &self,
        id: &VariableId,
        mode: &ModeId,
        value: Value,
    ) -> Result<(), DocumentError>;

    /// Delete a variable by identity.
    async fn delete_variable(&self, id: &VariableId) -> Result<(), DocumentError>;

    /// All document pages, in host order.
    async fn pages(&self) -> Vec<PageId>;

    /// Load a page so its nodes and bindings become available.
    async fn load_page(&self, page: &PageId) -> Result<(), DocumentError>;

    /// Identities of all nodes on a loaded page. Empty for unloaded or
    /// missing pages; bindings are unavailable until the page is loaded.
    async fn page_nodes(&self, page: &PageId) -> Vec<NodeId>;

    /// Bound-variable metadata for one node: each bound property with its
    /// reference(s). Empty when the node carries no bindings.
    async fn node_bound_properties(&self, node: &NodeId) -> Vec<(String, PropertyBinding)>;

    /// Repoint a scalar binding. `Ok(false)` when the node does not support
    /// the property (capability absent), `Ok(true)` on success.
    async fn set_scalar_binding(
        &self,
        node: &NodeId,
        property: &str,
        variable: &VariableId,
    ) -> Result<bool, DocumentError>;

    /// Read a node's paint list. `None` when the property is absent on the
    /// node. The returned list is a copy; writes go through
    /// [`set_paint_list`](Self::set_paint_list).
    async fn paint_list(
        &self,
        node: &NodeId,
        property: ListProperty,
    ) -> Result<Option<Vec<Paint>>, DocumentError>;

    /// Replace a node's paint list wholesale (copy-on-write discipline).
    async fn set_paint_list(
        &self,
        node: &NodeId,
        property: ListProperty,
        paints: Vec<Paint>,
    ) -> Result<(), DocumentError>;

    /// Surface a transient notification to the user.
    async fn notify(&self, message: &str);
}
