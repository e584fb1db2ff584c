//! End-to-end session tests against real files on disk.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use vrn_parser::{NodeUpdate, PropEntry, PropValue};
use vrn_workspace::{
    ClientRequest, DocumentSession, MpscChannel, RateLimitConfig, ServerEvent, SessionError,
    SessionOptions,
};

const TOKEN: &str = "integration-secret";

const HOME_VIEW: &str = r#"import React from 'react';
import { Screen, Text, Button } from '@visual-rn/core';

/**
 * @vrn-bindings
 * state: {
 *   message: string,
 * }
 * actions: {
 *   handleClick: function,
 * }
 */

export default function HomeView({ state, actions }) {
  return (
    <Screen p={16}>
      <Text children={state.message} color="primary" />
      <Button label="Go" onPress={actions.handleClick} />
    </Screen>
  );
}
"#;

const HOME_LOGIC: &str = r#"import { useState } from 'react';

export function useHomeLogic() {
  const [message, setMessage] = useState('hello');

  // Resets the greeting
  const handleClick = () => {
    setMessage('clicked');
  };

  return { message, handleClick };
}
"#;

fn new_session() -> DocumentSession {
    DocumentSession::new(SessionOptions::new(TOKEN))
}

fn connect(session: &mut DocumentSession) -> (u64, UnboundedReceiver<ServerEvent>) {
    let (channel, rx) = MpscChannel::pair();
    let id = session.connect(TOKEN, Box::new(channel)).unwrap();
    (id, rx)
}

fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn write_project(dir: &std::path::Path) -> PathBuf {
    let view_path = dir.join("Home.view.vrn");
    std::fs::write(&view_path, HOME_VIEW).unwrap();
    std::fs::write(dir.join("Home.logic.js"), HOME_LOGIC).unwrap();
    view_path
}

#[test]
fn test_rejected_connection_processes_nothing() {
    let mut session = new_session();
    let (channel, mut rx) = MpscChannel::pair();

    let result = session.connect("not-the-token", Box::new(channel));
    assert_eq!(result, Err(SessionError::AuthenticationFailure));
    assert!(rx.try_recv().is_err());

    // The rejected client never got a connection id, so any id it guesses
    // is unknown
    let result = session.handle_request(
        1,
        ClientRequest::FileOpen {
            path: PathBuf::from("/Home.view.vrn"),
        },
    );
    assert_eq!(result, Err(SessionError::UnknownConnection(1)));
}

#[test]
fn test_rate_limit_gates_requests() {
    let mut session = DocumentSession::new(SessionOptions {
        auth_token: TOKEN.to_string(),
        rate_limit: RateLimitConfig {
            max_requests: 3,
            window: Duration::from_secs(60),
        },
    });
    let (id, mut rx) = connect(&mut session);
    drain(&mut rx);

    for _ in 0..5 {
        session
            .handle_request(
                id,
                ClientRequest::FileOpen {
                    path: PathBuf::from("/nope.view.vrn"),
                },
            )
            .unwrap();
    }

    let events = drain(&mut rx);
    assert_eq!(events.len(), 5);
    assert!(events[..3]
        .iter()
        .all(|event| matches!(event, ServerEvent::ErrorParse { .. })));
    assert!(events[3..]
        .iter()
        .all(|event| matches!(event, ServerEvent::ErrorRateLimit { .. })));
}

#[test]
fn test_open_loads_tree_bindings_and_logic() {
    let dir = tempfile::tempdir().unwrap();
    let view_path = write_project(dir.path());

    let mut session = new_session();
    let (id, mut rx) = connect(&mut session);
    drain(&mut rx);

    session
        .handle_request(
            id,
            ClientRequest::FileOpen {
                path: view_path.clone(),
            },
        )
        .unwrap();

    match drain(&mut rx).pop().unwrap() {
        ServerEvent::FileLoaded {
            path,
            tree,
            bindings,
            logic_file,
            logic,
            ..
        } => {
            assert_eq!(path, view_path);
            assert_eq!(tree.name, "Screen");
            assert_eq!(tree.children.len(), 2);

            assert_eq!(bindings.state.len(), 1);
            assert_eq!(bindings.state[0].name, "message");
            assert_eq!(bindings.actions[0].name, "handleClick");

            assert_eq!(logic_file, Some(dir.path().join("Home.logic.js")));
            let logic = logic.unwrap();
            assert_eq!(logic.hook_name, "useHomeLogic");
            assert_eq!(logic.states[0].name, "message");
            assert_eq!(logic.actions[0].name, "handleClick");
        }
        other => panic!("expected file:loaded, got {:?}", other),
    }
}

#[test]
fn test_update_broadcasts_and_save_persists() {
    let dir = tempfile::tempdir().unwrap();
    let view_path = write_project(dir.path());

    let mut session = new_session();
    let (editor, mut editor_rx) = connect(&mut session);
    let (preview, mut preview_rx) = connect(&mut session);
    drain(&mut editor_rx);
    drain(&mut preview_rx);

    session
        .handle_request(
            editor,
            ClientRequest::FileOpen {
                path: view_path.clone(),
            },
        )
        .unwrap();
    drain(&mut editor_rx);

    let text_id = session
        .file_state(&view_path)
        .unwrap()
        .tree
        .children[0]
        .id
        .clone();

    session
        .handle_request(
            editor,
            ClientRequest::FileUpdate {
                path: view_path.clone(),
                node_id: text_id.clone(),
                updates: NodeUpdate {
                    props: Some(vec![
                        PropEntry {
                            name: "children".to_string(),
                            value: PropValue::BindingExpression {
                                path: "state.message".to_string(),
                            },
                        },
                        PropEntry {
                            name: "color".to_string(),
                            value: PropValue::StringLiteral {
                                value: "danger".to_string(),
                            },
                        },
                    ]),
                    ..Default::default()
                },
            },
        )
        .unwrap();

    // Issuer sees the acknowledgement, the other client sees the change
    assert!(matches!(
        drain(&mut editor_rx).pop().unwrap(),
        ServerEvent::FileUpdated { success: true, .. }
    ));
    match drain(&mut preview_rx).pop().unwrap() {
        ServerEvent::FileChanged { node_id, .. } => assert_eq!(node_id, text_id),
        other => panic!("expected file:changed, got {:?}", other),
    }

    session
        .handle_request(
            preview,
            ClientRequest::FileSave {
                path: view_path.clone(),
            },
        )
        .unwrap();
    assert!(matches!(
        drain(&mut preview_rx).pop().unwrap(),
        ServerEvent::FileSaved { success: true, .. }
    ));
    assert!(drain(&mut editor_rx).is_empty());

    let on_disk = std::fs::read_to_string(&view_path).unwrap();
    assert!(on_disk.contains("export default function HomeView({ state, actions })"));
    assert!(on_disk.contains("color=\"danger\""));
    assert!(on_disk.contains("children={state.message}"));
    assert!(on_disk.contains("onPress={actions.handleClick}"));
}

#[test]
fn test_rename_update_validates_against_schema() {
    let dir = tempfile::tempdir().unwrap();
    let view_path = write_project(dir.path());

    let mut session = new_session();
    let (id, mut rx) = connect(&mut session);
    drain(&mut rx);

    session
        .handle_request(
            id,
            ClientRequest::FileOpen {
                path: view_path.clone(),
            },
        )
        .unwrap();
    drain(&mut rx);

    let text_id = session
        .file_state(&view_path)
        .unwrap()
        .tree
        .children[0]
        .id
        .clone();

    // "chartreuse" is not in the color palette
    session
        .handle_request(
            id,
            ClientRequest::FileUpdate {
                path: view_path.clone(),
                node_id: text_id.clone(),
                updates: NodeUpdate {
                    name: Some("Text".to_string()),
                    props: Some(vec![PropEntry {
                        name: "color".to_string(),
                        value: PropValue::StringLiteral {
                            value: "chartreuse".to_string(),
                        },
                    }]),
                    ..Default::default()
                },
            },
        )
        .unwrap();

    match drain(&mut rx).pop().unwrap() {
        ServerEvent::ErrorUpdate { message, .. } => {
            assert!(message.contains("color"), "unexpected message: {message}");
        }
        other => panic!("expected error:update, got {:?}", other),
    }

    // Rejected update left the tree untouched
    let state = session.file_state(&view_path).unwrap();
    let text = state.tree.find(&text_id).unwrap();
    assert_eq!(
        text.get_prop("color"),
        Some(&PropValue::StringLiteral {
            value: "primary".to_string()
        })
    );
}

#[test]
fn test_external_change_reloads_and_broken_edit_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    let view_path = write_project(dir.path());

    let mut session = new_session();
    let (id, mut rx) = connect(&mut session);
    drain(&mut rx);

    session
        .handle_request(
            id,
            ClientRequest::FileOpen {
                path: view_path.clone(),
            },
        )
        .unwrap();
    drain(&mut rx);

    // Good external edit replaces the state and reaches every client
    let edited = HOME_VIEW.replace("color=\"primary\"", "color=\"muted\"");
    std::fs::write(&view_path, &edited).unwrap();
    session.handle_file_change(&view_path, vrn_workspace::FileChangeKind::Changed);

    match drain(&mut rx).pop().unwrap() {
        ServerEvent::FileReloaded { tree, .. } => {
            assert_eq!(
                tree.children[0].get_prop("color"),
                Some(&PropValue::StringLiteral {
                    value: "muted".to_string()
                })
            );
        }
        other => panic!("expected file:reloaded, got {:?}", other),
    }

    // Broken external edit reports but keeps the last good tree
    std::fs::write(&view_path, "export default function HomeView({ state, actions }) {\n  return (\n    <Screen>\n").unwrap();
    session.handle_file_change(&view_path, vrn_workspace::FileChangeKind::Changed);

    assert!(matches!(
        drain(&mut rx).pop().unwrap(),
        ServerEvent::ErrorReload { .. }
    ));
    let state = session.file_state(&view_path).unwrap();
    assert_eq!(
        state.tree.children[0].get_prop("color"),
        Some(&PropValue::StringLiteral {
            value: "muted".to_string()
        })
    );

    // Deletion drops the state entirely
    session.handle_file_change(&view_path, vrn_workspace::FileChangeKind::Deleted);
    assert!(matches!(
        drain(&mut rx).pop().unwrap(),
        ServerEvent::FileDeleted { .. }
    ));
    assert!(session.file_state(&view_path).is_none());
}

#[test]
fn test_logic_change_refreshes_contract() {
    let dir = tempfile::tempdir().unwrap();
    let view_path = write_project(dir.path());
    let logic_path = dir.path().join("Home.logic.js");

    let mut session = new_session();
    let (id, mut rx) = connect(&mut session);
    drain(&mut rx);

    session
        .handle_request(
            id,
            ClientRequest::FileOpen {
                path: view_path.clone(),
            },
        )
        .unwrap();
    drain(&mut rx);

    let extended = HOME_LOGIC.replace(
        "return { message, handleClick };",
        "const reset = () => {\n    setMessage('');\n  };\n\n  return { message, handleClick, reset };",
    );
    std::fs::write(&logic_path, extended).unwrap();
    session.handle_logic_file_change(&logic_path);

    match drain(&mut rx).pop().unwrap() {
        ServerEvent::LogicUpdated {
            path,
            logic_contract,
        } => {
            assert_eq!(path, view_path);
            let names: Vec<&str> = logic_contract
                .actions
                .iter()
                .map(|action| action.name.as_str())
                .collect();
            assert_eq!(names, vec!["handleClick", "reset"]);
        }
        other => panic!("expected logic:updated, got {:?}", other),
    }
}
