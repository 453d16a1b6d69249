//! The four-phase variable migration protocol.
//!
//! A migration moves a set of variables into a destination collection by
//! creating metadata-only replacements ("shells"), copying values with alias
//! rewriting, repointing every consumer binding, and finally deleting the
//! originals. The phases run strictly in order: the identity map must be
//! fully populated before any alias can be rewritten, and every shell must
//! hold its final identity before consumers are rebound to it.
//!
//! There is no rollback. Per-item failures are counted and logged at the item
//! boundary and the run keeps moving forward; partial success is a normal
//! terminal state.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use varmove_document::{
    Collection, CollectionId, DocumentError, DocumentHost, Value, Variable, VariableId,
};

use crate::bindings::BindingRewriter;

/// Whether originals are deleted when some bindings could not be rebound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Delete every original that received a shell, even when rebinds failed.
    /// Consumers that failed to rebind are left pointing at a deleted
    /// identity.
    #[default]
    Always,
    /// Skip deletion entirely when any rebind failed, leaving every original
    /// in place alongside its shell.
    RequireCleanRebind,
}

/// Tuning for one migration run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    pub deletion_policy: DeletionPolicy,
}

/// Aggregate counts for one migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Shells successfully created.
    pub created: usize,
    /// Variables lost to shell-creation or value-copy failures.
    pub errors: usize,
    /// Consumer bindings successfully repointed.
    pub rebind_successes: usize,
    /// Consumer bindings that could not be repointed.
    pub rebind_failures: usize,
    /// Originals deleted.
    pub deleted: usize,
}

/// Completed milestones of a migration, in order. No phase is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    /// Inputs validated; nothing mutated yet.
    Validated,
    /// Shells exist in the destination with metadata copied, values unset.
    ShellsCreated,
    /// Per-mode values copied, aliases rewritten through the identity map.
    ValuesCopied,
    /// Consumer bindings repointed at the shells.
    BindingsRebound,
    /// Originals deleted (subject to the deletion policy).
    OriginalsDeleted,
    /// Terminal.
    Complete,
}

/// One migration run over a live document.
///
/// The struct owns the identity map and all counters, so a run can be stepped
/// phase by phase and inspected between steps.
pub struct Migration<'a, H: DocumentHost> {
    host: &'a H,
    destination: CollectionId,
    movable: Vec<Variable>,
    options: MigrationOptions,
    phase: MigrationPhase,
    identity_map: HashMap<VariableId, VariableId>,
    report: MigrationReport,
}

impl<'a, H: DocumentHost> Migration<'a, H> {
    /// Start a migration of `movable` (already duplicate-filtered, in
    /// selection order) into `destination`.
    pub fn new(
        host: &'a H,
        destination: CollectionId,
        movable: Vec<Variable>,
        options: MigrationOptions,
    ) -> Self {
        Self {
            host,
            destination,
            movable,
            options,
            phase: MigrationPhase::Validated,
            identity_map: HashMap::new(),
            report: MigrationReport::default(),
        }
    }

    /// The last completed milestone.
    pub fn phase(&self) -> MigrationPhase {
        self.phase
    }

    /// Original identity -> shell identity, for everything that passed the
    /// shell-creation phase so far. Discarded with the run.
    pub fn identity_map(&self) -> &HashMap<VariableId, VariableId> {
        &self.identity_map
    }

    /// Snapshot of the counters.
    pub fn report(&self) -> MigrationReport {
        self.report
    }

    /// Advance one phase. A no-op once complete.
    pub async fn step(&mut self) {
        match self.phase {
            MigrationPhase::Validated => {
                self.create_shells().await;
                self.phase = MigrationPhase::ShellsCreated;
            }
            MigrationPhase::ShellsCreated => {
                self.copy_values().await;
                self.phase = MigrationPhase::ValuesCopied;
            }
            MigrationPhase::ValuesCopied => {
                self.rebind_consumers().await;
                self.phase = MigrationPhase::BindingsRebound;
            }
            MigrationPhase::BindingsRebound => {
                self.delete_originals().await;
                self.phase = MigrationPhase::OriginalsDeleted;
            }
            MigrationPhase::OriginalsDeleted => {
                info!(
                    created = self.report.created,
                    errors = self.report.errors,
                    rebound = self.report.rebind_successes,
                    rebind_failures = self.report.rebind_failures,
                    deleted = self.report.deleted,
                    "migration complete"
                );
                self.phase = MigrationPhase::Complete;
            }
            MigrationPhase::Complete => {}
        }
    }

    /// Drive the run to completion and return the final counts.
    #[tracing::instrument(skip(self), fields(destination = %self.destination, selected = self.movable.len()))]
    pub async fn run(mut self) -> MigrationReport {
        while self.phase != MigrationPhase::Complete {
            self.step().await;
        }
        self.report
    }

    /// Shell creation: a metadata-only copy of each movable variable in the
    /// destination. Values are intentionally not set yet.
    async fn create_shells(&mut self) {
        let originals = self.movable.clone();
        for original in &originals {
            match self.create_shell(original).await {
                Ok(shell) => {
                    debug!(original = %original.id, shell = %shell, name = %original.name, "created shell");
                    self.identity_map.insert(original.id.clone(), shell);
                    self.report.created += 1;
                }
                Err(e) => {
                    warn!(
                        original = %original.id,
                        name = %original.name,
                        error = %e,
                        "shell creation failed, variable excluded from move"
                    );
                    self.report.errors += 1;
                }
            }
        }
        info!(
            created = self.report.created,
            failed = self.report.errors,
            "created shells in destination"
        );
    }

    async fn create_shell(&self, original: &Variable) -> Result<VariableId, DocumentError> {
        let shell = self
            .host
            .create_variable(&self.destination, &original.name, original.resolved_type)
            .await?;
        self.host
            .set_variable_description(&shell, &original.description)
            .await?;
        self.host
            .set_variable_hidden(&shell, original.hidden_from_publishing)
            .await?;
        if !original.scopes.is_empty() {
            self.host
                .set_variable_scopes(&shell, &original.scopes)
                .await?;
        }
        for (platform, syntax) in &original.code_syntax {
            self.host
                .set_variable_code_syntax(&shell, platform, syntax)
                .await?;
        }
        Ok(shell)
    }

    /// Value copy: pair destination modes with original mode values
    /// positionally, rewriting aliases through the identity map.
    async fn copy_values(&mut self) {
        // Re-resolve the destination at the phase boundary; the document may
        // have changed while shells were being created.
        let Some(destination) = self.host.collection(&self.destination).await else {
            warn!(collection = %self.destination, "destination vanished before value copy");
            self.report.errors += self.identity_map.len();
            return;
        };

        let moved: Vec<(VariableId, VariableId)> = self
            .movable
            .iter()
            .filter_map(|v| {
                self.identity_map
                    .get(&v.id)
                    .map(|shell| (v.id.clone(), shell.clone()))
            })
            .collect();

        for (original_id, shell_id) in moved {
            if let Err(e) = self
                .copy_variable_values(&original_id, &shell_id, &destination)
                .await
            {
                warn!(original = %original_id, error = %e, "value copy failed");
                self.report.errors += 1;
            }
        }
    }

    async fn copy_variable_values(
        &self,
        original_id: &VariableId,
        shell_id: &VariableId,
        destination: &Collection,
    ) -> Result<(), DocumentError> {
        // Re-resolve by identity rather than trusting the validation-time
        // snapshot across suspension points.
        let Some(original) = self.host.variable(original_id).await else {
            return Err(DocumentError::VariableNotFound(original_id.to_string()));
        };

        for (position, mode) in destination.modes.iter().enumerate() {
            // Positional pairing: the i-th destination mode takes the i-th
            // original mode value. Destination modes beyond the original's
            // count stay unset; surplus original modes are dropped.
            let Some(value) = original.value_at(position) else {
                break;
            };

            let rewritten = match value {
                Value::Alias(referenced) => {
                    if let Some(replacement) = self.identity_map.get(referenced) {
                        // The alias target moves in this run too: point the
                        // copy at its shell so the moved graph stays
                        // internally consistent regardless of move order.
                        Some(Value::Alias(replacement.clone()))
                    } else if self.host.variable(referenced).await.is_some() {
                        // Target stays behind: an intentional cross-collection
                        // reference to the unmoved original.
                        Some(Value::Alias(referenced.clone()))
                    } else {
                        warn!(
                            original = %original.id,
                            referenced = %referenced,
                            mode = %mode.id,
                            "alias target no longer exists, leaving mode unset"
                        );
                        None
                    }
                }
                literal => Some(literal.clone()),
            };

            if let Some(value) = rewritten {
                self.host
                    .set_variable_value(shell_id, &mode.id, value)
                    .await?;
            }
        }
        Ok(())
    }

    /// Rebind every consumer of a moved original to its shell.
    async fn rebind_consumers(&mut self) {
        if self.identity_map.is_empty() {
            debug!("no shells created, skipping rebind");
            return;
        }

        let rewriter = BindingRewriter::new(self.host);
        let targets: HashSet<VariableId> = self.identity_map.keys().cloned().collect();
        let bindings = rewriter.locate(&targets).await;

        for binding in &bindings {
            let Some(replacement) = self.identity_map.get(&binding.variable) else {
                continue;
            };
            if rewriter.rebind(binding, replacement).await {
                self.report.rebind_successes += 1;
            } else {
                self.report.rebind_failures += 1;
            }
        }
        info!(
            rebound = self.report.rebind_successes,
            failed = self.report.rebind_failures,
            "rebound consumer bindings"
        );
    }

    /// Delete every original that received a shell, in selection order,
    /// independent of value-copy and rebind outcomes for that variable,
    /// unless the deletion policy gates on clean rebinds.
    async fn delete_originals(&mut self) {
        if self.options.deletion_policy == DeletionPolicy::RequireCleanRebind
            && self.report.rebind_failures > 0
        {
            info!(
                rebind_failures = self.report.rebind_failures,
                "keeping originals: deletion requires a clean rebind"
            );
            return;
        }

        let ids: Vec<VariableId> = self
            .movable
            .iter()
            .map(|v| v.id.clone())
            .filter(|id| self.identity_map.contains_key(id))
            .collect();

        for id in ids {
            match self.host.delete_variable(&id).await {
                Ok(()) => self.report.deleted += 1,
                Err(e) => {
                    warn!(original = %id, error = %e, "failed to delete original");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varmove_document::{MemoryDocument, ResolvedType};

    async fn movable_in(doc: &MemoryDocument, col: &CollectionId) -> Vec<Variable> {
        doc.collection_variables(col).await
    }

    #[tokio::test]
    async fn phases_advance_in_order() {
        let doc = MemoryDocument::new();
        let source = doc.add_collection("Source", &["Default"]);
        let destination = doc.add_collection("Destination", &["Default"]);
        doc.add_variable(&source, "token", ResolvedType::Float);

        let movable = movable_in(&doc, &source).await;
        let mut migration =
            Migration::new(&doc, destination, movable, MigrationOptions::default());

        assert_eq!(migration.phase(), MigrationPhase::Validated);
        migration.step().await;
        assert_eq!(migration.phase(), MigrationPhase::ShellsCreated);
        assert_eq!(migration.identity_map().len(), 1);
        migration.step().await;
        assert_eq!(migration.phase(), MigrationPhase::ValuesCopied);
        migration.step().await;
        assert_eq!(migration.phase(), MigrationPhase::BindingsRebound);
        migration.step().await;
        assert_eq!(migration.phase(), MigrationPhase::OriginalsDeleted);
        migration.step().await;
        assert_eq!(migration.phase(), MigrationPhase::Complete);

        // Stepping past Complete is a no-op.
        migration.step().await;
        assert_eq!(migration.phase(), MigrationPhase::Complete);
        assert_eq!(migration.report().created, 1);
        assert_eq!(migration.report().deleted, 1);
    }

    #[tokio::test]
    async fn empty_selection_is_a_clean_noop() {
        let doc = MemoryDocument::new();
        doc.add_collection("Source", &["Default"]);
        let destination = doc.add_collection("Destination", &["Default"]);

        let report = Migration::new(&doc, destination, Vec::new(), MigrationOptions::default())
            .run()
            .await;

        assert_eq!(report, MigrationReport::default());
    }
}
