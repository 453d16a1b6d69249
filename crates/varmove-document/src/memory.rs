//! In-memory [`DocumentHost`] implementation for tests.
//!
//! Builds a synthetic document out of collections, variables, pages, and
//! nodes, and implements the full host surface over it. Failure injection
//! hooks let tests exercise the per-item failure paths (rejected creations,
//! rejected value writes, rejected deletions) without a live host.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::DocumentError;
use crate::host::DocumentHost;
use crate::types::{
    Collection, CollectionId, ListProperty, Mode, ModeId, ModeValue, NodeId, PageId, Paint,
    PropertyBinding, ResolvedType, Value, Variable, VariableId,
};

#[derive(Default)]
struct NodeState {
    scalar_bindings: BTreeMap<String, VariableId>,
    supported_scalars: HashSet<String>,
    paint_lists: HashMap<ListProperty, Vec<Paint>>,
}

#[derive(Default)]
struct State {
    collections: Vec<Collection>,
    variables: HashMap<VariableId, Variable>,
    pages: Vec<PageId>,
    loaded_pages: HashSet<PageId>,
    page_nodes: HashMap<PageId, Vec<NodeId>>,
    nodes: HashMap<NodeId, NodeState>,
    notifications: Vec<String>,
    fail_creates: HashSet<String>,
    fail_value_writes: HashSet<VariableId>,
    fail_deletes: HashSet<VariableId>,
    next_id: u64,
}

impl State {
    fn mint(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}:{}", prefix, self.next_id)
    }

    fn collection_mut(&mut self, id: &CollectionId) -> Option<&mut Collection> {
        self.collections.iter_mut().find(|c| &c.id == id)
    }

    fn collection_ref(&self, id: &CollectionId) -> Option<&Collection> {
        self.collections.iter().find(|c| &c.id == id)
    }
}

/// An in-memory document implementing [`DocumentHost`].
pub struct MemoryDocument {
    state: Mutex<State>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty document.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory document lock poisoned")
    }

    /// Add a collection with the given mode names. Mode ids are minted.
    pub fn add_collection(&self, name: &str, mode_names: &[&str]) -> CollectionId {
        let mut state = self.state();
        let id = CollectionId::new(state.mint("col"));
        let modes = mode_names
            .iter()
            .map(|mode_name| Mode {
                id: ModeId::new(state.mint("mode")),
                name: (*mode_name).to_string(),
            })
            .collect();
        state.collections.push(Collection {
            id: id.clone(),
            name: name.to_string(),
            modes,
            variable_ids: Vec::new(),
        });
        id
    }

    /// The mode id at `index` within a collection.
    ///
    /// # Panics
    ///
    /// Panics when the collection or index does not exist; this is a test
    /// construction helper.
    pub fn mode_id(&self, collection: &CollectionId, index: usize) -> ModeId {
        let state = self.state();
        let collection = state
            .collection_ref(collection)
            .unwrap_or_else(|| panic!("unknown collection {collection}"));
        collection.modes[index].id.clone()
    }

    /// Add a variable with no values set. Ids are minted.
    pub fn add_variable(
        &self,
        collection: &CollectionId,
        name: &str,
        resolved_type: ResolvedType,
    ) -> VariableId {
        let mut state = self.state();
        let id = VariableId::new(state.mint("var"));
        let variable = Variable {
            id: id.clone(),
            name: name.to_string(),
            collection_id: collection.clone(),
            resolved_type,
            description: String::new(),
            hidden_from_publishing: false,
            scopes: Vec::new(),
            code_syntax: BTreeMap::new(),
            values_by_mode: Vec::new(),
        };
        state
            .collection_mut(collection)
            .unwrap_or_else(|| panic!("unknown collection {collection}"))
            .variable_ids
            .push(id.clone());
        state.variables.insert(id.clone(), variable);
        id
    }

    /// Directly mutate a variable during test construction.
    pub fn update_variable(&self, id: &VariableId, f: impl FnOnce(&mut Variable)) {
        let mut state = self.state();
        let variable = state
            .variables
            .get_mut(id)
            .unwrap_or_else(|| panic!("unknown variable {id}"));
        f(variable);
    }

    /// Set a variable's value for one mode during test construction,
    /// bypassing failure injection.
    pub fn seed_value(&self, id: &VariableId, mode: &ModeId, value: Value) {
        let mut state = self.state();
        write_mode_value(&mut state, id, mode, value)
            .unwrap_or_else(|e| panic!("seed_value failed: {e}"));
    }

    /// Add an (unloaded) page.
    pub fn add_page(&self, _name: &str) -> PageId {
        let mut state = self.state();
        let id = PageId::new(state.mint("page"));
        state.pages.push(id.clone());
        state.page_nodes.insert(id.clone(), Vec::new());
        id
    }

    /// Add a node to a page.
    pub fn add_node(&self, page: &PageId) -> NodeId {
        let mut state = self.state();
        let id = NodeId::new(state.mint("node"));
        state
            .page_nodes
            .get_mut(page)
            .unwrap_or_else(|| panic!("unknown page {page}"))
            .push(id.clone());
        state.nodes.insert(id.clone(), NodeState::default());
        id
    }

    /// Bind a scalar property on a node. The property becomes supported.
    pub fn bind_scalar(&self, node: &NodeId, property: &str, variable: &VariableId) {
        let mut state = self.state();
        let node = state
            .nodes
            .get_mut(node)
            .unwrap_or_else(|| panic!("unknown node {node}"));
        node.supported_scalars.insert(property.to_string());
        node.scalar_bindings
            .insert(property.to_string(), variable.clone());
    }

    /// Withdraw scalar-property support from a node, simulating a consumer
    /// that lost the capability between locate and rebind.
    pub fn remove_scalar_support(&self, node: &NodeId, property: &str) {
        let mut state = self.state();
        if let Some(node) = state.nodes.get_mut(node) {
            node.supported_scalars.remove(property);
        }
    }

    /// Set a node's paint list for test construction.
    pub fn set_paints(&self, node: &NodeId, property: ListProperty, paints: Vec<Paint>) {
        let mut state = self.state();
        state
            .nodes
            .get_mut(node)
            .unwrap_or_else(|| panic!("unknown node {node}"))
            .paint_lists
            .insert(property, paints);
    }

    /// Reject any future creation of a variable with this name.
    pub fn fail_creation_of(&self, name: &str) {
        self.state().fail_creates.insert(name.to_string());
    }

    /// Reject any future value write on this variable.
    pub fn fail_value_writes_for(&self, id: &VariableId) {
        self.state().fail_value_writes.insert(id.clone());
    }

    /// Reject any future deletion of this variable.
    pub fn fail_deletion_of(&self, id: &VariableId) {
        self.state().fail_deletes.insert(id.clone());
    }

    /// Notifications surfaced so far, in order.
    pub fn notifications(&self) -> Vec<String> {
        self.state().notifications.clone()
    }

    /// Pages that have been loaded so far.
    pub fn loaded_pages(&self) -> Vec<PageId> {
        let state = self.state();
        state
            .pages
            .iter()
            .filter(|p| state.loaded_pages.contains(*p))
            .cloned()
            .collect()
    }

    /// Total number of variables in the document.
    pub fn variable_count(&self) -> usize {
        self.state().variables.len()
    }
}

fn write_mode_value(
    state: &mut State,
    id: &VariableId,
    mode: &ModeId,
    value: Value,
) -> Result<(), DocumentError> {
    let collection_id = state
        .variables
        .get(id)
        .ok_or_else(|| DocumentError::VariableNotFound(id.to_string()))?
        .collection_id
        .clone();
    let modes: Vec<ModeId> = state
        .collection_ref(&collection_id)
        .ok_or_else(|| DocumentError::CollectionNotFound(collection_id.to_string()))?
        .modes
        .iter()
        .map(|m| m.id.clone())
        .collect();
    if !modes.contains(mode) {
        return Err(DocumentError::ModeNotFound {
            collection: collection_id.to_string(),
            mode: mode.to_string(),
        });
    }

    let variable = state
        .variables
        .get_mut(id)
        .ok_or_else(|| DocumentError::VariableNotFound(id.to_string()))?;
    if let Some(entry) = variable.values_by_mode.iter_mut().find(|mv| &mv.mode_id == mode) {
        entry.value = value;
    } else {
        variable.values_by_mode.push(ModeValue {
            mode_id: mode.clone(),
            value,
        });
        // Keep entries in the collection's mode order.
        variable.values_by_mode.sort_by_key(|mv| {
            modes
                .iter()
                .position(|m| m == &mv.mode_id)
                .unwrap_or(usize::MAX)
        });
    }
    Ok(())
}

#[async_trait]
impl DocumentHost for MemoryDocument {
    async fn collections(&self) -> Vec<Collection> {
        self.state().collections.clone()
    }

    async fn collection(&self, id: &CollectionId) -> Option<Collection> {
        self.state().collection_ref(id).cloned()
    }

    async fn variable(&self, id: &VariableId) -> Option<Variable> {
        self.state().variables.get(id).cloned()
    }

    async fn collection_variables(&self, id: &CollectionId) -> Vec<Variable> {
        let state = self.state();
        let Some(collection) = state.collection_ref(id) else {
            return Vec::new();
        };
        collection
            .variable_ids
            .iter()
            .filter_map(|vid| state.variables.get(vid))
            .cloned()
            .collect()
    }

    async fn create_variable(
        &self,
        collection: &CollectionId,
        name: &str,
        resolved_type: ResolvedType,
    ) -> Result<VariableId, DocumentError> {
        let mut state = self.state();
        if state.fail_creates.contains(name) {
            return Err(DocumentError::CreationRejected(name.to_string()));
        }
        let Some(existing) = state.collection_ref(collection) else {
            return Err(DocumentError::CollectionNotFound(collection.to_string()));
        };
        let duplicate = existing
            .variable_ids
            .iter()
            .filter_map(|vid| state.variables.get(vid))
            .any(|v| v.name == name);
        if duplicate {
            return Err(DocumentError::CreationRejected(format!(
                "name already in use: {name}"
            )));
        }

        let id = VariableId::new(state.mint("var"));
        let variable = Variable {
            id: id.clone(),
            name: name.to_string(),
            collection_id: collection.clone(),
            resolved_type,
            description: String::new(),
            hidden_from_publishing: false,
            scopes: Vec::new(),
            code_syntax: BTreeMap::new(),
            values_by_mode: Vec::new(),
        };
        state
            .collection_mut(collection)
            .expect("collection checked above")
            .variable_ids
            .push(id.clone());
        state.variables.insert(id.clone(), variable);
        Ok(id)
    }

    async fn set_variable_description(
        &self,
        id: &VariableId,
        description: &str,
    ) -> Result<(), DocumentError> {
        let mut state = self.state();
        let variable = state
            .variables
            .get_mut(id)
            .ok_or_else(|| DocumentError::VariableNotFound(id.to_string()))?;
        variable.description = description.to_string();
        Ok(())
    }

    async fn set_variable_hidden(
        &self,
        id: &VariableId,
        hidden: bool,
    ) -> Result<(), DocumentError> {
        let mut state = self.state();
        let variable = state
            .variables
            .get_mut(id)
            .ok_or_else(|| DocumentError::VariableNotFound(id.to_string()))?;
        variable.hidden_from_publishing = hidden;
        Ok(())
    }

    async fn set_variable_scopes(
        &self,
        id: &VariableId,
        scopes: &[String],
    ) -> Result<(), DocumentError> {
        let mut state = self.state();
        let variable = state
            .variables
            .get_mut(id)
            .ok_or_else(|| DocumentError::VariableNotFound(id.to_string()))?;
        variable.scopes = scopes.to_vec();
        Ok(())
    }

    async fn set_variable_code_syntax(
        &self,
        id: &VariableId,
        platform: &str,
        syntax: &str,
    ) -> Result<(), DocumentError> {
        let mut state = self.state();
        let variable = state
            .variables
            .get_mut(id)
            .ok_or_else(|| DocumentError::VariableNotFound(id.to_string()))?;
        variable
            .code_syntax
            .insert(platform.to_string(), syntax.to_string());
        Ok(())
    }

    async fn set_variable_value(
        &self,
        id: &VariableId,
        mode: &ModeId,
        value: Value,
    ) -> Result<(), DocumentError> {
        let mut state = self.state();
        if state.fail_value_writes.contains(id) {
            return Err(DocumentError::WriteRejected(format!(
                "value write rejected for {id}"
            )));
        }
        write_mode_value(&mut state, id, mode, value)
    }

    async fn delete_variable(&self, id: &VariableId) -> Result<(), DocumentError> {
        let mut state = self.state();
        if state.fail_deletes.contains(id) {
            return Err(DocumentError::WriteRejected(format!(
                "deletion rejected for {id}"
            )));
        }
        let variable = state
            .variables
            .remove(id)
            .ok_or_else(|| DocumentError::VariableNotFound(id.to_string()))?;
        if let Some(collection) = state.collection_mut(&variable.collection_id) {
            collection.variable_ids.retain(|vid| vid != id);
        }
        Ok(())
    }

    async fn pages(&self) -> Vec<PageId> {
        self.state().pages.clone()
    }

    async fn load_page(&self, page: &PageId) -> Result<(), DocumentError> {
        let mut state = self.state();
        if !state.pages.contains(page) {
            return Err(DocumentError::PageNotFound(page.to_string()));
        }
        state.loaded_pages.insert(page.clone());
        Ok(())
    }

    async fn page_nodes(&self, page: &PageId) -> Vec<NodeId> {
        let state = self.state();
        if !state.loaded_pages.contains(page) {
            return Vec::new();
        }
        state.page_nodes.get(page).cloned().unwrap_or_default()
    }

    async fn node_bound_properties(&self, node: &NodeId) -> Vec<(String, PropertyBinding)> {
        let state = self.state();
        let Some(node) = state.nodes.get(node) else {
            return Vec::new();
        };
        let mut properties: Vec<(String, PropertyBinding)> = node
            .scalar_bindings
            .iter()
            .map(|(property, variable)| {
                (property.clone(), PropertyBinding::Single(variable.clone()))
            })
            .collect();
        for property in [ListProperty::Fills, ListProperty::Strokes, ListProperty::Effects] {
            if let Some(paints) = node.paint_lists.get(&property)
                && paints.iter().any(|p| p.bound_variable.is_some())
            {
                let refs = paints.iter().map(|p| p.bound_variable.clone()).collect();
                properties.push((property.as_str().to_string(), PropertyBinding::List(refs)));
            }
        }
        properties
    }

    async fn set_scalar_binding(
        &self,
        node: &NodeId,
        property: &str,
        variable: &VariableId,
    ) -> Result<bool, DocumentError> {
        let mut state = self.state();
        let node = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| DocumentError::NodeNotFound(node.to_string()))?;
        if !node.supported_scalars.contains(property) {
            return Ok(false);
        }
        node.scalar_bindings
            .insert(property.to_string(), variable.clone());
        Ok(true)
    }

    async fn paint_list(
        &self,
        node: &NodeId,
        property: ListProperty,
    ) -> Result<Option<Vec<Paint>>, DocumentError> {
        let state = self.state();
        let node = state
            .nodes
            .get(node)
            .ok_or_else(|| DocumentError::NodeNotFound(node.to_string()))?;
        Ok(node.paint_lists.get(&property).cloned())
    }

    async fn set_paint_list(
        &self,
        node: &NodeId,
        property: ListProperty,
        paints: Vec<Paint>,
    ) -> Result<(), DocumentError> {
        let mut state = self.state();
        let node_state = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| DocumentError::NodeNotFound(node.to_string()))?;
        if !node_state.paint_lists.contains_key(&property) {
            return Err(DocumentError::WriteRejected(format!(
                "node {node} has no {property} list"
            )));
        }
        node_state.paint_lists.insert(property, paints);
        Ok(())
    }

    async fn notify(&self, message: &str) {
        self.state().notifications.push(message.to_string());
    }
}
