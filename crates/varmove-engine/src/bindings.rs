//! Locating and rewriting consumer bindings across the node tree.

use std::collections::HashSet;

use tracing::{debug, warn};

use varmove_document::{
    Binding, DocumentError, DocumentHost, ListProperty, PropertyBinding, VariableId,
};

/// Finds and repoints every consumer reference to a set of variable
/// identities.
pub struct BindingRewriter<'a, H: DocumentHost> {
    host: &'a H,
}

impl<'a, H: DocumentHost> BindingRewriter<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Collect every binding across the document that references one of
    /// `targets`.
    ///
    /// Every page is loaded before traversal; bindings are unavailable on
    /// unloaded pages. A page that fails to load is logged and skipped; its
    /// bindings simply go unfound. Bindings referencing variables outside
    /// `targets` are never touched.
    pub async fn locate(&self, targets: &HashSet<VariableId>) -> Vec<Binding> {
        let mut bindings = Vec::new();

        for page in self.host.pages().await {
            if let Err(e) = self.host.load_page(&page).await {
                warn!(page = %page, error = %e, "failed to load page, skipping");
                continue;
            }
            for node in self.host.page_nodes(&page).await {
                for (property, binding) in self.host.node_bound_properties(&node).await {
                    match binding {
                        PropertyBinding::Single(variable) => {
                            if targets.contains(&variable) {
                                bindings.push(Binding {
                                    node: node.clone(),
                                    property: property.clone(),
                                    variable,
                                    index: None,
                                });
                            }
                        }
                        PropertyBinding::List(entries) => {
                            for (index, entry) in entries.into_iter().enumerate() {
                                if let Some(variable) = entry
                                    && targets.contains(&variable)
                                {
                                    bindings.push(Binding {
                                        node: node.clone(),
                                        property: property.clone(),
                                        variable,
                                        index: Some(index),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        debug!(count = bindings.len(), "located bindings");
        bindings
    }

    /// Repoint one binding to `replacement`.
    ///
    /// Returns `false`, never an error, when the binding could not be
    /// migrated: the node lost the property, the paint list shrank below the
    /// recorded index, or the host rejected the write. Callers count a
    /// `false`; they never retry it, and other bindings proceed regardless.
    pub async fn rebind(&self, binding: &Binding, replacement: &VariableId) -> bool {
        match self.try_rebind(binding, replacement).await {
            Ok(done) => done,
            Err(e) => {
                warn!(
                    node = %binding.node,
                    property = %binding.property,
                    error = %e,
                    "rebind failed"
                );
                false
            }
        }
    }

    async fn try_rebind(
        &self,
        binding: &Binding,
        replacement: &VariableId,
    ) -> Result<bool, DocumentError> {
        let Some(index) = binding.index else {
            return self
                .host
                .set_scalar_binding(&binding.node, &binding.property, replacement)
                .await;
        };

        // Indexed rebinds are restricted to the paint-carrying lists.
        let Some(property) = ListProperty::parse(&binding.property) else {
            return Ok(false);
        };
        let Some(paints) = self.host.paint_list(&binding.node, property).await? else {
            return Ok(false);
        };
        if index >= paints.len() {
            return Ok(false);
        }

        // The host treats paint lists as copy-on-write: clone, replace the
        // one entry, write the whole list back.
        let mut updated = paints.clone();
        updated[index] = paints[index].with_binding(replacement);
        self.host
            .set_paint_list(&binding.node, property, updated)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use varmove_document::{MemoryDocument, NodeId, Paint, ResolvedType};

    fn solid() -> Paint {
        Paint::unbound(json!({"type": "SOLID"}))
    }

    #[tokio::test]
    async fn locate_finds_scalar_and_list_bindings() {
        let doc = MemoryDocument::new();
        let col = doc.add_collection("Brand", &["Default"]);
        let target = doc.add_variable(&col, "primary", ResolvedType::Color);
        let other = doc.add_variable(&col, "secondary", ResolvedType::Color);

        let page = doc.add_page("Page 1");
        let scalar_node = doc.add_node(&page);
        doc.bind_scalar(&scalar_node, "cornerRadius", &target);
        let fill_node = doc.add_node(&page);
        doc.set_paints(
            &fill_node,
            ListProperty::Fills,
            vec![solid(), solid().with_binding(&target)],
        );
        // Bound to an unrelated variable: must never surface.
        let unrelated = doc.add_node(&page);
        doc.bind_scalar(&unrelated, "opacity", &other);

        let rewriter = BindingRewriter::new(&doc);
        let targets = HashSet::from([target.clone()]);
        let mut bindings = rewriter.locate(&targets).await;
        bindings.sort_by(|a, b| a.property.cmp(&b.property));

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].property, "cornerRadius");
        assert_eq!(bindings[0].index, None);
        assert_eq!(bindings[1].property, "fills");
        assert_eq!(bindings[1].index, Some(1));
        assert!(bindings.iter().all(|b| b.variable == target));
    }

    #[tokio::test]
    async fn locate_loads_every_page_first() {
        let doc = MemoryDocument::new();
        let col = doc.add_collection("Brand", &["Default"]);
        let target = doc.add_variable(&col, "primary", ResolvedType::Color);

        let page_a = doc.add_page("A");
        let page_b = doc.add_page("B");
        let node_a = doc.add_node(&page_a);
        let node_b = doc.add_node(&page_b);
        doc.bind_scalar(&node_a, "opacity", &target);
        doc.bind_scalar(&node_b, "opacity", &target);

        let rewriter = BindingRewriter::new(&doc);
        let bindings = rewriter.locate(&HashSet::from([target])).await;

        assert_eq!(bindings.len(), 2);
        assert_eq!(doc.loaded_pages().len(), 2);
    }

    #[tokio::test]
    async fn rebind_scalar_repoints_node() {
        let doc = MemoryDocument::new();
        let col = doc.add_collection("Brand", &["Default"]);
        let old = doc.add_variable(&col, "primary", ResolvedType::Color);
        let new = doc.add_variable(&col, "primary-2", ResolvedType::Color);

        let page = doc.add_page("Page 1");
        let node = doc.add_node(&page);
        doc.bind_scalar(&node, "cornerRadius", &old);

        let rewriter = BindingRewriter::new(&doc);
        let bindings = rewriter.locate(&HashSet::from([old.clone()])).await;
        assert_eq!(bindings.len(), 1);

        assert!(rewriter.rebind(&bindings[0], &new).await);

        // The old identity no longer appears anywhere.
        assert!(rewriter.locate(&HashSet::from([old])).await.is_empty());
        assert_eq!(rewriter.locate(&HashSet::from([new])).await.len(), 1);
    }

    #[tokio::test]
    async fn rebind_list_replaces_single_entry() {
        let doc = MemoryDocument::new();
        let col = doc.add_collection("Brand", &["Default"]);
        let old = doc.add_variable(&col, "primary", ResolvedType::Color);
        let new = doc.add_variable(&col, "primary-2", ResolvedType::Color);

        let page = doc.add_page("Page 1");
        let node = doc.add_node(&page);
        doc.set_paints(
            &node,
            ListProperty::Fills,
            vec![solid(), solid().with_binding(&old), solid()],
        );

        let rewriter = BindingRewriter::new(&doc);
        let bindings = rewriter.locate(&HashSet::from([old.clone()])).await;
        assert_eq!(bindings.len(), 1);

        assert!(rewriter.rebind(&bindings[0], &new).await);

        let paints = doc
            .paint_list(&node, ListProperty::Fills)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paints.len(), 3);
        assert_eq!(paints[0].bound_variable, None);
        assert_eq!(paints[1].bound_variable, Some(new));
        assert_eq!(paints[2].bound_variable, None);
    }

    #[tokio::test]
    async fn rebind_reports_false_on_missing_capability() {
        let doc = MemoryDocument::new();
        let col = doc.add_collection("Brand", &["Default"]);
        let old = doc.add_variable(&col, "primary", ResolvedType::Color);
        let new = doc.add_variable(&col, "primary-2", ResolvedType::Color);

        let page = doc.add_page("Page 1");
        let node = doc.add_node(&page);
        doc.bind_scalar(&node, "cornerRadius", &old);

        let rewriter = BindingRewriter::new(&doc);
        let bindings = rewriter.locate(&HashSet::from([old.clone()])).await;

        // Capability withdrawn between locate and rebind.
        doc.remove_scalar_support(&node, "cornerRadius");
        assert!(!rewriter.rebind(&bindings[0], &new).await);
    }

    #[tokio::test]
    async fn rebind_reports_false_when_list_shrank() {
        let doc = MemoryDocument::new();
        let col = doc.add_collection("Brand", &["Default"]);
        let old = doc.add_variable(&col, "primary", ResolvedType::Color);
        let new = doc.add_variable(&col, "primary-2", ResolvedType::Color);

        let page = doc.add_page("Page 1");
        let node = doc.add_node(&page);
        doc.set_paints(
            &node,
            ListProperty::Fills,
            vec![solid(), solid().with_binding(&old)],
        );

        let rewriter = BindingRewriter::new(&doc);
        let bindings = rewriter.locate(&HashSet::from([old.clone()])).await;
        assert_eq!(bindings[0].index, Some(1));

        // The list shrank between locate and rebind.
        doc.set_paints(&node, ListProperty::Fills, vec![solid()]);
        assert!(!rewriter.rebind(&bindings[0], &new).await);
    }

    #[tokio::test]
    async fn rebind_rejects_indexed_scalar_property() {
        let doc = MemoryDocument::new();
        let page = doc.add_page("Page 1");
        let node = doc.add_node(&page);

        let rewriter = BindingRewriter::new(&doc);
        // An indexed binding on a non-list property is never migrated.
        let binding = Binding {
            node: node.clone(),
            property: "cornerRadius".to_string(),
            variable: VariableId::new("var:1"),
            index: Some(0),
        };
        assert!(!rewriter.rebind(&binding, &VariableId::new("var:2")).await);
    }

    #[tokio::test]
    async fn rebind_converts_host_errors_to_false() {
        let doc = MemoryDocument::new();
        let rewriter = BindingRewriter::new(&doc);
        // Node does not exist: the host error is swallowed into `false`.
        let binding = Binding {
            node: NodeId::new("node:404"),
            property: "opacity".to_string(),
            variable: VariableId::new("var:1"),
            index: None,
        };
        assert!(!rewriter.rebind(&binding, &VariableId::new("var:2")).await);
    }
}
