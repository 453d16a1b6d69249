//! Session coordinator: validates requests, sequences the engine, and
//! aggregates one summary per move.

use std::sync::Arc;

use tracing::{debug, info, warn};

use varmove_document::{CollectionId, DocumentHost, Variable, VariableId};
use varmove_engine::{
    CollectionInspector, Migration, MigrationOptions, partition, type_label,
};

use crate::error::SessionError;
use crate::protocol::{Request, Response, VariablePreview};

/// Both a source and a destination must be chosen.
pub const MSG_MISSING_SELECTION: &str =
    "Please select both a source and a destination collection.";
/// Moving a collection onto itself is meaningless.
pub const MSG_SAME_COLLECTION: &str = "Source and destination collections must be different.";
/// An empty selection has nothing to move.
pub const MSG_EMPTY_SELECTION: &str = "Select at least one variable to move.";
/// One of the collections disappeared since it was picked.
pub const MSG_COLLECTION_NOT_FOUND: &str = "Collection not found. It may have been deleted.";
/// Every selected variable disappeared since it was picked.
pub const MSG_NO_VALID_VARIABLES: &str =
    "None of the selected variables could be found. They may have been deleted.";
/// Every selected variable collides with a destination name.
pub const MSG_ALL_DUPLICATES: &str =
    "All selected variables already exist in the destination collection.";

/// One presentation-layer session over a document host.
///
/// Requests are handled one at a time; a move is a single uninterrupted
/// logical sequence from the session's point of view. `close-plugin` marks
/// the session closed and produces no response.
pub struct Session<H: DocumentHost> {
    host: Arc<H>,
    options: MigrationOptions,
    closed: bool,
}

impl<H: DocumentHost> Session<H> {
    /// A session with default migration options.
    pub fn new(host: Arc<H>) -> Self {
        Self::with_options(host, MigrationOptions::default())
    }

    /// A session with explicit migration options (e.g. a stricter deletion
    /// policy).
    pub fn with_options(host: Arc<H>, options: MigrationOptions) -> Self {
        Self {
            host,
            options,
            closed: false,
        }
    }

    /// Whether `close-plugin` has been received.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Handle one request. `None` only for `close-plugin`.
    pub async fn handle(&mut self, request: Request) -> Option<Response> {
        debug!(request = ?request, "handling request");
        match request {
            Request::GetCollections => Some(self.get_collections().await),
            Request::GetVariablesPreview { collection_id } => {
                Some(self.get_variables_preview(&collection_id).await)
            }
            Request::CheckDuplicates {
                source_collection_id,
                destination_collection_id,
            } => Some(
                self.check_duplicates(&source_collection_id, &destination_collection_id)
                    .await,
            ),
            Request::MoveVariables {
                source_collection_id,
                destination_collection_id,
                selected_variable_ids,
            } => Some(
                self.move_variables(
                    source_collection_id,
                    destination_collection_id,
                    selected_variable_ids,
                )
                .await,
            ),
            Request::ClosePlugin => {
                info!("session closed");
                self.closed = true;
                None
            }
        }
    }

    /// Handle one raw JSON request. `Ok(None)` only for `close-plugin`.
    pub async fn handle_json(&mut self, raw: &str) -> Result<Option<String>, SessionError> {
        let request: Request = serde_json::from_str(raw)?;
        match self.handle(request).await {
            Some(response) => Ok(Some(serde_json::to_string(&response)?)),
            None => Ok(None),
        }
    }

    async fn get_collections(&self) -> Response {
        let inspector = CollectionInspector::new(&*self.host);
        Response::Collections {
            collections: inspector.list_collections().await,
        }
    }

    async fn get_variables_preview(&self, collection: &CollectionId) -> Response {
        let inspector = CollectionInspector::new(&*self.host);
        let variables: Vec<VariablePreview> = inspector
            .list_variables(collection)
            .await
            .into_iter()
            .map(preview)
            .collect();
        let count = variables.len();
        Response::VariablesPreview { variables, count }
    }

    async fn check_duplicates(
        &self,
        source: &CollectionId,
        destination: &CollectionId,
    ) -> Response {
        let inspector = CollectionInspector::new(&*self.host);
        let candidates = inspector.list_variables(source).await;
        let names = inspector.name_set(destination).await;
        let split = partition(candidates, &names);

        Response::DuplicatesReport {
            duplicate_count: split.blocked.len(),
            can_move_count: split.movable.len(),
            duplicates: split.blocked.into_iter().map(preview).collect(),
            can_move: split.movable.into_iter().map(preview).collect(),
        }
    }

    /// Validate and run one move. Validation failures surface a distinct
    /// message each and mutate nothing; once mutation begins the caller
    /// always receives a completion summary.
    async fn move_variables(
        &self,
        source: CollectionId,
        destination: CollectionId,
        selected: Vec<VariableId>,
    ) -> Response {
        if source.as_str().is_empty() || destination.as_str().is_empty() {
            return self.reject(MSG_MISSING_SELECTION).await;
        }
        if source == destination {
            return self.reject(MSG_SAME_COLLECTION).await;
        }
        if selected.is_empty() {
            return self.reject(MSG_EMPTY_SELECTION).await;
        }
        if self.host.collection(&source).await.is_none() {
            return self.reject(MSG_COLLECTION_NOT_FOUND).await;
        }
        let Some(destination_collection) = self.host.collection(&destination).await else {
            return self.reject(MSG_COLLECTION_NOT_FOUND).await;
        };

        // Re-resolve the selection by identity; stale ids are dropped.
        let mut resolved: Vec<Variable> = Vec::new();
        for id in &selected {
            match self.host.variable(id).await {
                Some(variable) => resolved.push(variable),
                None => debug!(variable = %id, "selected variable no longer exists"),
            }
        }
        if resolved.is_empty() {
            return self.reject(MSG_NO_VALID_VARIABLES).await;
        }

        let inspector = CollectionInspector::new(&*self.host);
        let names = inspector.name_set(&destination).await;
        let split = partition(resolved, &names);
        if split.movable.is_empty() {
            return self.reject(MSG_ALL_DUPLICATES).await;
        }
        let skipped = split.blocked.len();

        info!(
            source = %source,
            destination = %destination,
            selected = selected.len(),
            movable = split.movable.len(),
            skipped,
            "starting move"
        );

        let report = Migration::new(&*self.host, destination, split.movable, self.options)
            .run()
            .await;

        let summary = format!(
            "Moved {} variable(s) to \"{}\"",
            report.created, destination_collection.name
        );
        self.host.notify(&summary).await;

        Response::MoveComplete {
            success_count: report.created,
            error_count: report.errors,
            skipped_count: skipped,
            rebind_success_count: report.rebind_successes,
            rebind_error_count: report.rebind_failures,
            deleted_count: report.deleted,
            destination_name: destination_collection.name,
        }
    }

    async fn reject(&self, message: &str) -> Response {
        warn!(reason = message, "move request rejected");
        self.host.notify(message).await;
        Response::MoveError {
            message: message.to_string(),
        }
    }
}

fn preview(variable: Variable) -> VariablePreview {
    VariablePreview {
        id: variable.id,
        name: variable.name,
        type_label: type_label(variable.resolved_type.as_str()).to_string(),
        description: variable.description,
    }
}
