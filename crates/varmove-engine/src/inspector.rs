//! Read-only queries over collections, variables, and modes.

use std::collections::HashSet;

use serde::Serialize;

use varmove_document::{CollectionId, DocumentHost, ModeId, Variable};

/// Normalize a raw host type tag to its user-facing label.
///
/// The host tags numeric variables `FLOAT`; users see `NUMBER`. Every other
/// tag passes through unchanged, which makes the normalization idempotent.
pub fn type_label(raw: &str) -> &str {
    if raw == "FLOAT" { "NUMBER" } else { raw }
}

/// One mode of a collection, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeSummary {
    pub id: ModeId,
    pub name: String,
}

/// Summary of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub id: CollectionId,
    pub name: String,
    pub variable_count: usize,
    pub modes: Vec<ModeSummary>,
}

/// Side-effect-free queries against the document host.
pub struct CollectionInspector<'a, H: DocumentHost> {
    host: &'a H,
}

impl<'a, H: DocumentHost> CollectionInspector<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// All collections, in host order.
    pub async fn list_collections(&self) -> Vec<CollectionSummary> {
        self.host
            .collections()
            .await
            .into_iter()
            .map(|collection| CollectionSummary {
                id: collection.id,
                name: collection.name,
                variable_count: collection.variable_ids.len(),
                modes: collection
                    .modes
                    .into_iter()
                    .map(|mode| ModeSummary {
                        id: mode.id,
                        name: mode.name,
                    })
                    .collect(),
            })
            .collect()
    }

    /// All variables of a collection, in member order. Empty (not an error)
    /// when the collection is absent.
    pub async fn list_variables(&self, collection: &CollectionId) -> Vec<Variable> {
        self.host.collection_variables(collection).await
    }

    /// The set of variable names currently used in a collection.
    pub async fn name_set(&self, collection: &CollectionId) -> HashSet<String> {
        self.host
            .collection_variables(collection)
            .await
            .into_iter()
            .map(|variable| variable.name)
            .collect()
    }
}
