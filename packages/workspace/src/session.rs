//! Live-sync document session.
//!
//! One session owns the in-memory state of every open view file and the set
//! of connected editor clients. All mutations flow through `&mut self`, so
//! file state is serialized by construction; callers that need sharing wrap
//! the session in `Arc<Mutex<_>>`.
//!
//! Per-request failures are delivered to the originating client as typed
//! `error:*` events and never tear down the session. Disk content is
//! authoritative at rest; in-memory state is a cache that diverges until
//! `file:save` or an external change notification reconciles it.

use crate::channel::Channel;
use crate::components;
use crate::protocol::{ClientRequest, ServerEvent};
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::watcher::FileChangeKind;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use vrn_logic::{analyze_file, find_corresponding_logic_file, view_file_for_logic_file, LogicContract};
use vrn_parser::{parse, update_node, Bindings, DocumentNode, Generator, NodeUpdate};

pub type ConnectionId = u64;

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("Authentication failure: token mismatch")]
    AuthenticationFailure,

    #[error("Unknown connection {0}")]
    UnknownConnection(ConnectionId),
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Token every inbound connection must present
    pub auth_token: String,
    pub rate_limit: RateLimitConfig,
}

impl SessionOptions {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// In-memory state of one loaded view file, exclusively owned by the session
pub struct SessionFileState {
    pub path: PathBuf,
    /// Current source text; regenerated on update, written on save
    pub source: String,
    pub component_name: Option<String>,
    pub tree: Arc<DocumentNode>,
    pub bindings: Bindings,
    pub logic_file: Option<PathBuf>,
    pub logic: Option<LogicContract>,
    pub last_modified: i64,
}

struct ClientConnection {
    channel: Box<dyn Channel>,
    limiter: RateLimiter,
}

pub struct DocumentSession {
    options: SessionOptions,
    files: HashMap<PathBuf, SessionFileState>,
    connections: HashMap<ConnectionId, ClientConnection>,
    next_connection_id: ConnectionId,
    project_files: Vec<PathBuf>,
}

impl DocumentSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            files: HashMap::new(),
            connections: HashMap::new(),
            next_connection_id: 1,
            project_files: Vec::new(),
        }
    }

    /// View files advertised in the `project:loaded` greeting
    pub fn set_project_files(&mut self, files: Vec<PathBuf>) {
        self.project_files = files;
    }

    /// Admit a client. The token must match the session's issued token;
    /// nothing is processed for a rejected connection.
    pub fn connect(
        &mut self,
        token: &str,
        channel: Box<dyn Channel>,
    ) -> Result<ConnectionId, SessionError> {
        if token != self.options.auth_token {
            channel.close();
            return Err(SessionError::AuthenticationFailure);
        }

        let id = self.next_connection_id;
        self.next_connection_id += 1;

        channel.send(ServerEvent::ProjectLoaded {
            files: self.project_files.clone(),
            components: components::definitions().to_vec(),
        });

        self.connections.insert(
            id,
            ClientConnection {
                channel,
                limiter: RateLimiter::new(self.options.rate_limit),
            },
        );

        tracing::info!(connection = id, "client connected");
        Ok(id)
    }

    pub fn disconnect(&mut self, id: ConnectionId) {
        if let Some(connection) = self.connections.remove(&id) {
            connection.channel.close();
            tracing::info!(connection = id, "client disconnected");
        }
    }

    /// Dispatch one client request. Rate limiting gates every request;
    /// excess requests get `error:rate-limit` and nothing else runs.
    pub fn handle_request(
        &mut self,
        id: ConnectionId,
        request: ClientRequest,
    ) -> Result<(), SessionError> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(SessionError::UnknownConnection(id))?;

        if !connection.limiter.check() {
            connection.channel.send(ServerEvent::ErrorRateLimit {
                message: "request budget exceeded, retry after the window resets".to_string(),
            });
            return Ok(());
        }

        match request {
            ClientRequest::FileOpen { path } => self.open_file(id, &path),
            ClientRequest::FileUpdate {
                path,
                node_id,
                updates,
            } => self.update_file(id, &path, &node_id, updates),
            ClientRequest::FileSave { path } => self.save_file(id, &path),
        }
        Ok(())
    }

    pub fn file_state(&self, path: &Path) -> Option<&SessionFileState> {
        self.files.get(path)
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn open_file(&mut self, id: ConnectionId, path: &Path) {
        match self.load_file(path) {
            Ok(state) => {
                let event = loaded_event(&state, false);
                self.files.insert(path.to_path_buf(), state);
                self.send_to(id, event);
            }
            Err(message) => {
                self.send_to(
                    id,
                    ServerEvent::ErrorParse {
                        path: path.to_path_buf(),
                        message,
                    },
                );
            }
        }
    }

    fn update_file(&mut self, id: ConnectionId, path: &Path, node_id: &str, updates: NodeUpdate) {
        let (tree, bindings, component_name) = match self.files.get(path) {
            Some(state) => (
                Arc::clone(&state.tree),
                state.bindings.clone(),
                state.component_name.clone(),
            ),
            None => {
                self.send_error_update(id, path, format!("File not loaded: {}", path.display()));
                return;
            }
        };

        // Renaming a node validates the new prop set against its schema
        if let (Some(name), Some(props)) = (&updates.name, &updates.props) {
            if let Err(violations) = components::validate_props(name, props) {
                self.send_error_update(id, path, violations.join("; "));
                return;
            }
        }

        let new_tree = match update_node(&tree, node_id, &updates) {
            Some(new_tree) => new_tree,
            None => {
                self.send_error_update(id, path, format!("Node not found: {}", node_id));
                return;
            }
        };

        let generator = match &component_name {
            Some(name) => Generator::with_component_name(name.clone()),
            None => Generator::new(),
        };
        let source = match generator.generate(&new_tree, &bindings) {
            Ok(source) => source,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "generation failed after update");
                self.send_error_update(id, path, err.to_string());
                return;
            }
        };

        if let Some(state) = self.files.get_mut(path) {
            state.tree = new_tree;
            state.source = source;
            state.last_modified = now_millis();
        }

        self.send_to(
            id,
            ServerEvent::FileUpdated {
                path: path.to_path_buf(),
                success: true,
            },
        );
        self.broadcast_except(
            id,
            ServerEvent::FileChanged {
                path: path.to_path_buf(),
                node_id: node_id.to_string(),
                updates,
            },
        );
    }

    fn save_file(&mut self, id: ConnectionId, path: &Path) {
        let source = match self.files.get(path) {
            Some(state) => state.source.clone(),
            None => {
                self.send_to(
                    id,
                    ServerEvent::ErrorSave {
                        path: path.to_path_buf(),
                        message: format!("File not loaded: {}", path.display()),
                    },
                );
                return;
            }
        };

        match std::fs::write(path, source) {
            Ok(()) => {
                self.send_to(
                    id,
                    ServerEvent::FileSaved {
                        path: path.to_path_buf(),
                        success: true,
                    },
                );
            }
            Err(err) => {
                self.send_to(
                    id,
                    ServerEvent::ErrorSave {
                        path: path.to_path_buf(),
                        message: err.to_string(),
                    },
                );
            }
        }
    }

    /// React to an external change to a view file
    pub fn handle_file_change(&mut self, path: &Path, kind: FileChangeKind) {
        match kind {
            FileChangeKind::Changed => match self.load_file(path) {
                Ok(state) => {
                    let event = loaded_event(&state, true);
                    self.files.insert(path.to_path_buf(), state);
                    self.broadcast_all(event);
                }
                Err(message) => {
                    // Previous good state stays in place
                    tracing::error!(path = %path.display(), %message, "reload failed");
                    self.broadcast_all(ServerEvent::ErrorReload {
                        path: path.to_path_buf(),
                        message,
                    });
                }
            },
            FileChangeKind::Deleted => {
                self.files.remove(path);
                self.broadcast_all(ServerEvent::FileDeleted {
                    path: path.to_path_buf(),
                });
            }
            FileChangeKind::Created => {
                // Not eagerly loaded; clients open it on demand
                self.broadcast_all(ServerEvent::FileCreated {
                    path: path.to_path_buf(),
                });
            }
        }
    }

    /// React to an external change to a companion logic file
    pub fn handle_logic_file_change(&mut self, logic_path: &Path) {
        let view_path = match view_file_for_logic_file(logic_path) {
            Some(view_path) => view_path,
            None => return,
        };
        if !self.files.contains_key(&view_path) {
            return;
        }

        match analyze_file(logic_path) {
            Ok(contract) => {
                if let Some(state) = self.files.get_mut(&view_path) {
                    state.logic = Some(contract.clone());
                    state.last_modified = now_millis();
                }
                self.broadcast_all(ServerEvent::LogicUpdated {
                    path: view_path,
                    logic_contract: contract,
                });
            }
            Err(err) => {
                tracing::error!(path = %logic_path.display(), error = %err, "logic re-analysis failed");
                self.broadcast_all(ServerEvent::ErrorLogic {
                    path: logic_path.to_path_buf(),
                    message: err.to_string(),
                });
            }
        }
    }

    fn load_file(&self, path: &Path) -> Result<SessionFileState, String> {
        if !path.exists() {
            return Err(format!("File not found: {}", path.display()));
        }

        let source = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
        let parsed = parse(&source).map_err(|err| err.to_string())?;

        let logic_file = find_corresponding_logic_file(path);
        let logic = match &logic_file {
            Some(logic_path) => match analyze_file(logic_path) {
                Ok(contract) => Some(contract),
                Err(err) => {
                    // A broken logic file never blocks the view file
                    tracing::warn!(path = %logic_path.display(), error = %err, "logic analysis failed");
                    None
                }
            },
            None => None,
        };

        Ok(SessionFileState {
            path: path.to_path_buf(),
            source,
            component_name: parsed.component_name,
            tree: Arc::new(parsed.tree),
            bindings: parsed.bindings,
            logic_file,
            logic,
            last_modified: now_millis(),
        })
    }

    fn send_error_update(&self, id: ConnectionId, path: &Path, message: String) {
        self.send_to(
            id,
            ServerEvent::ErrorUpdate {
                path: path.to_path_buf(),
                message,
            },
        );
    }

    fn send_to(&self, id: ConnectionId, event: ServerEvent) {
        if let Some(connection) = self.connections.get(&id) {
            connection.channel.send(event);
        }
    }

    fn broadcast_all(&self, event: ServerEvent) {
        for connection in self.connections.values() {
            connection.channel.send(event.clone());
        }
    }

    fn broadcast_except(&self, id: ConnectionId, event: ServerEvent) {
        for (connection_id, connection) in &self.connections {
            if *connection_id != id {
                connection.channel.send(event.clone());
            }
        }
    }
}

fn loaded_event(state: &SessionFileState, reload: bool) -> ServerEvent {
    let path = state.path.clone();
    let tree = Arc::clone(&state.tree);
    let bindings = state.bindings.clone();
    let logic_file = state.logic_file.clone();
    let logic = state.logic.clone();
    let last_modified = state.last_modified;

    if reload {
        ServerEvent::FileReloaded {
            path,
            tree,
            bindings,
            logic_file,
            logic,
            last_modified,
        }
    } else {
        ServerEvent::FileLoaded {
            path,
            tree,
            bindings,
            logic_file,
            logic,
            last_modified,
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MpscChannel;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn session() -> DocumentSession {
        DocumentSession::new(SessionOptions::new("secret"))
    }

    fn connect(session: &mut DocumentSession) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let (channel, rx) = MpscChannel::pair();
        let id = session.connect("secret", Box::new(channel)).unwrap();
        (id, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_connect_greeting() {
        let mut session = session();
        session.set_project_files(vec![PathBuf::from("/app/Home.view.vrn")]);
        let (_, mut rx) = connect(&mut session);

        match rx.try_recv().unwrap() {
            ServerEvent::ProjectLoaded { files, components } => {
                assert_eq!(files, vec![PathBuf::from("/app/Home.view.vrn")]);
                assert_eq!(components.len(), 11);
            }
            other => panic!("expected project:loaded, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_token_rejected() {
        let mut session = session();
        let (channel, mut rx) = MpscChannel::pair();
        let result = session.connect("wrong", Box::new(channel));
        assert_eq!(result, Err(SessionError::AuthenticationFailure));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_open_missing_file_reports_error() {
        let mut session = session();
        let (id, mut rx) = connect(&mut session);
        drain(&mut rx);

        session
            .handle_request(
                id,
                ClientRequest::FileOpen {
                    path: PathBuf::from("/nope/Missing.view.vrn"),
                },
            )
            .unwrap();

        match drain(&mut rx).pop().unwrap() {
            ServerEvent::ErrorParse { message, .. } => {
                assert!(message.contains("File not found"));
            }
            other => panic!("expected error:parse, got {:?}", other),
        }
    }

    #[test]
    fn test_update_unloaded_file_reports_error() {
        let mut session = session();
        let (id, mut rx) = connect(&mut session);
        drain(&mut rx);

        session
            .handle_request(
                id,
                ClientRequest::FileUpdate {
                    path: PathBuf::from("/nope/Missing.view.vrn"),
                    node_id: "node-1".to_string(),
                    updates: NodeUpdate::default(),
                },
            )
            .unwrap();

        assert!(matches!(
            drain(&mut rx).pop().unwrap(),
            ServerEvent::ErrorUpdate { .. }
        ));
    }

    #[test]
    fn test_unknown_connection_is_an_error() {
        let mut session = session();
        let result = session.handle_request(
            99,
            ClientRequest::FileSave {
                path: PathBuf::from("/x.view.vrn"),
            },
        );
        assert_eq!(result, Err(SessionError::UnknownConnection(99)));
    }
}
