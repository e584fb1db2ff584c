//! Wire protocol between the session and its clients.
//!
//! Events serialize as `{"event": "<name>", "payload": {...}}` with
//! camelCase payload fields, matching what the visual editor speaks.

use crate::components::ComponentDefinition;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use vrn_logic::LogicContract;
use vrn_parser::{Bindings, DocumentNode, NodeUpdate};

/// Requests a client may issue after admission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all_fields = "camelCase")]
pub enum ClientRequest {
    #[serde(rename = "file:open")]
    FileOpen { path: PathBuf },

    #[serde(rename = "file:update")]
    FileUpdate {
        path: PathBuf,
        node_id: String,
        updates: NodeUpdate,
    },

    #[serde(rename = "file:save")]
    FileSave { path: PathBuf },
}

/// Responses and broadcasts sent by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Greeting after successful admission
    #[serde(rename = "project:loaded")]
    ProjectLoaded {
        files: Vec<PathBuf>,
        components: Vec<ComponentDefinition>,
    },

    #[serde(rename = "file:loaded")]
    FileLoaded {
        path: PathBuf,
        tree: Arc<DocumentNode>,
        bindings: Bindings,
        logic_file: Option<PathBuf>,
        logic: Option<LogicContract>,
        last_modified: i64,
    },

    #[serde(rename = "file:updated")]
    FileUpdated { path: PathBuf, success: bool },

    /// Broadcast to every client other than the one that issued the update
    #[serde(rename = "file:changed")]
    FileChanged {
        path: PathBuf,
        node_id: String,
        updates: NodeUpdate,
    },

    #[serde(rename = "file:saved")]
    FileSaved { path: PathBuf, success: bool },

    #[serde(rename = "file:reloaded")]
    FileReloaded {
        path: PathBuf,
        tree: Arc<DocumentNode>,
        bindings: Bindings,
        logic_file: Option<PathBuf>,
        logic: Option<LogicContract>,
        last_modified: i64,
    },

    #[serde(rename = "file:deleted")]
    FileDeleted { path: PathBuf },

    #[serde(rename = "file:created")]
    FileCreated { path: PathBuf },

    #[serde(rename = "logic:updated")]
    LogicUpdated {
        path: PathBuf,
        logic_contract: LogicContract,
    },

    #[serde(rename = "error:parse")]
    ErrorParse { path: PathBuf, message: String },

    #[serde(rename = "error:update")]
    ErrorUpdate { path: PathBuf, message: String },

    #[serde(rename = "error:save")]
    ErrorSave { path: PathBuf, message: String },

    #[serde(rename = "error:reload")]
    ErrorReload { path: PathBuf, message: String },

    #[serde(rename = "error:logic")]
    ErrorLogic { path: PathBuf, message: String },

    #[serde(rename = "error:rate-limit")]
    ErrorRateLimit { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = ClientRequest::FileOpen {
            path: PathBuf::from("/app/Home.view.vrn"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["event"], "file:open");
        assert_eq!(json["payload"]["path"], "/app/Home.view.vrn");

        let back: ClientRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_update_request_camel_case_fields() {
        let request = ClientRequest::FileUpdate {
            path: PathBuf::from("/app/Home.view.vrn"),
            node_id: "node-2".to_string(),
            updates: NodeUpdate::default(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["event"], "file:update");
        assert_eq!(json["payload"]["nodeId"], "node-2");
    }

    #[test]
    fn test_event_names() {
        let event = ServerEvent::FileDeleted {
            path: PathBuf::from("/app/Home.view.vrn"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "file:deleted");

        let event = ServerEvent::ErrorRateLimit {
            message: "rate limit exceeded".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "error:rate-limit");
    }

    #[test]
    fn test_loaded_payload_fields() {
        let event = ServerEvent::FileLoaded {
            path: PathBuf::from("/app/Home.view.vrn"),
            tree: Arc::new(DocumentNode::empty("node-1".to_string())),
            bindings: Bindings::default(),
            logic_file: Some(PathBuf::from("/app/Home.logic.js")),
            logic: None,
            last_modified: 1700000000000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "file:loaded");
        assert_eq!(json["payload"]["logicFile"], "/app/Home.logic.js");
        assert_eq!(json["payload"]["lastModified"], 1700000000000i64);
    }
}
