//! Request and response records exchanged with the presentation layer.
//!
//! The transport itself (UI panel, message bus) is out of scope; these are
//! the tagged records it carries. Requests deserialize from, and responses
//! serialize to, `{"type": "..."}`-tagged JSON with camelCase fields.

use serde::{Deserialize, Serialize};

use varmove_document::{CollectionId, VariableId};
use varmove_engine::CollectionSummary;

/// A request from the presentation layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Request {
    /// Enumerate collections for the pickers.
    GetCollections,
    /// Preview the variables of one collection.
    #[serde(rename_all = "camelCase")]
    GetVariablesPreview { collection_id: CollectionId },
    /// Report which source variables collide with destination names.
    #[serde(rename_all = "camelCase")]
    CheckDuplicates {
        source_collection_id: CollectionId,
        destination_collection_id: CollectionId,
    },
    /// Move the selected variables.
    #[serde(rename_all = "camelCase")]
    MoveVariables {
        source_collection_id: CollectionId,
        destination_collection_id: CollectionId,
        selected_variable_ids: Vec<VariableId>,
    },
    /// Terminate the session. No response.
    ClosePlugin,
}

/// One variable as shown in previews and duplicate reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariablePreview {
    pub id: VariableId,
    pub name: String,
    /// User-facing type label (numeric variables display as `NUMBER`).
    #[serde(rename = "type")]
    pub type_label: String,
    pub description: String,
}

/// A response to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Response {
    /// All collections, in host order.
    Collections { collections: Vec<CollectionSummary> },
    /// Variables of one collection.
    #[serde(rename_all = "camelCase")]
    VariablesPreview {
        variables: Vec<VariablePreview>,
        count: usize,
    },
    /// Duplicate partition of a source against a destination.
    #[serde(rename_all = "camelCase")]
    DuplicatesReport {
        duplicates: Vec<VariablePreview>,
        can_move: Vec<VariablePreview>,
        duplicate_count: usize,
        can_move_count: usize,
    },
    /// A move request failed validation; nothing was mutated.
    #[serde(rename_all = "camelCase")]
    MoveError { message: String },
    /// A move ran to completion (possibly with partial failures).
    #[serde(rename_all = "camelCase")]
    MoveComplete {
        success_count: usize,
        error_count: usize,
        skipped_count: usize,
        rebind_success_count: usize,
        rebind_error_count: usize,
        deleted_count: usize,
        destination_name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    // Request tests

    #[test]
    fn get_collections_deserializes() {
        let req: Request = serde_json::from_str(r#"{"type": "get-collections"}"#).unwrap();
        assert_eq!(req, Request::GetCollections);
    }

    #[test]
    fn get_variables_preview_deserializes() {
        let json = r#"{"type": "get-variables-preview", "collectionId": "col:1"}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        assert_eq!(
            req,
            Request::GetVariablesPreview {
                collection_id: CollectionId::new("col:1"),
            }
        );
    }

    #[test]
    fn check_duplicates_deserializes() {
        let json = r#"{
            "type": "check-duplicates",
            "sourceCollectionId": "col:1",
            "destinationCollectionId": "col:2"
        }"#;
        let req: Request = serde_json::from_str(json).unwrap();
        assert_eq!(
            req,
            Request::CheckDuplicates {
                source_collection_id: CollectionId::new("col:1"),
                destination_collection_id: CollectionId::new("col:2"),
            }
        );
    }

    #[test]
    fn move_variables_deserializes() {
        let json = r#"{
            "type": "move-variables",
            "sourceCollectionId": "col:1",
            "destinationCollectionId": "col:2",
            "selectedVariableIds": ["var:1", "var:2"]
        }"#;
        let req: Request = serde_json::from_str(json).unwrap();
        assert_eq!(
            req,
            Request::MoveVariables {
                source_collection_id: CollectionId::new("col:1"),
                destination_collection_id: CollectionId::new("col:2"),
                selected_variable_ids: vec![VariableId::new("var:1"), VariableId::new("var:2")],
            }
        );
    }

    #[test]
    fn close_plugin_deserializes() {
        let req: Request = serde_json::from_str(r#"{"type": "close-plugin"}"#).unwrap();
        assert_eq!(req, Request::ClosePlugin);
    }

    #[test]
    fn unknown_request_type_is_rejected() {
        let result: Result<Request, _> =
            serde_json::from_str(r#"{"type": "reticulate-splines"}"#);
        assert!(result.is_err());
    }

    // Response tests

    #[test]
    fn variables_preview_serializes_camel_case() {
        let response = Response::VariablesPreview {
            variables: vec![VariablePreview {
                id: VariableId::new("var:1"),
                name: "spacing".to_string(),
                type_label: "NUMBER".to_string(),
                description: "Base spacing".to_string(),
            }],
            count: 1,
        };

        let parsed: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(parsed["type"], "variables-preview");
        assert_eq!(parsed["count"], 1);
        assert_eq!(parsed["variables"][0]["id"], "var:1");
        assert_eq!(parsed["variables"][0]["type"], "NUMBER");
        assert_eq!(parsed["variables"][0]["description"], "Base spacing");
    }

    #[test]
    fn duplicates_report_serializes() {
        let preview = VariablePreview {
            id: VariableId::new("var:1"),
            name: "accent".to_string(),
            type_label: "COLOR".to_string(),
            description: String::new(),
        };
        let response = Response::DuplicatesReport {
            duplicates: vec![preview.clone()],
            can_move: vec![],
            duplicate_count: 1,
            can_move_count: 0,
        };

        let parsed: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(parsed["type"], "duplicates-report");
        assert_eq!(parsed["duplicateCount"], 1);
        assert_eq!(parsed["canMoveCount"], 0);
        assert_eq!(parsed["duplicates"][0]["name"], "accent");
        assert!(parsed["canMove"].as_array().unwrap().is_empty());
    }

    #[test]
    fn move_complete_serializes_counts() {
        let response = Response::MoveComplete {
            success_count: 2,
            error_count: 0,
            skipped_count: 1,
            rebind_success_count: 5,
            rebind_error_count: 1,
            deleted_count: 2,
            destination_name: "Tokens".to_string(),
        };

        let parsed: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(parsed["type"], "move-complete");
        assert_eq!(parsed["successCount"], 2);
        assert_eq!(parsed["errorCount"], 0);
        assert_eq!(parsed["skippedCount"], 1);
        assert_eq!(parsed["rebindSuccessCount"], 5);
        assert_eq!(parsed["rebindErrorCount"], 1);
        assert_eq!(parsed["deletedCount"], 2);
        assert_eq!(parsed["destinationName"], "Tokens");
    }

    #[test]
    fn move_error_serializes() {
        let response = Response::MoveError {
            message: "Select at least one variable to move.".to_string(),
        };
        let parsed: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            parsed,
            json!({
                "type": "move-error",
                "message": "Select at least one variable to move.",
            })
        );
    }
}
