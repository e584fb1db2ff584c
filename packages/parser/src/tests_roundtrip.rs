//! Parse/generate round-trip coverage.
//!
//! Generated output is a fixed point: parsing it and generating again yields
//! byte-identical text, and the reparsed tree is structurally equivalent
//! (IDs and source positions aside).

use crate::ast::{DocumentNode, NodeKind, PropValue};
use crate::generator::generate;
use crate::parser::parse;

/// Clear per-parse fields so trees from different parses compare structurally
fn normalized(node: &DocumentNode) -> DocumentNode {
    DocumentNode {
        id: String::new(),
        kind: node.kind,
        name: node.name.clone(),
        props: node.props.clone(),
        children: node
            .children
            .iter()
            .map(|child| std::sync::Arc::new(normalized(child)))
            .collect(),
        bindings: node.bindings.clone(),
        metadata: Default::default(),
    }
}

fn assert_fixed_point(source: &str) -> String {
    let first = parse(source).unwrap();
    let gen1 = generate(&first.tree, &first.bindings).unwrap();

    let second = parse(&gen1).unwrap();
    let gen2 = generate(&second.tree, &second.bindings).unwrap();
    assert_eq!(gen1, gen2);

    let third = parse(&gen2).unwrap();
    assert_eq!(normalized(&third.tree), normalized(&second.tree));
    assert_eq!(third.bindings, second.bindings);

    gen1
}

#[test]
fn test_full_view_file_round_trip() {
    let source = r#"import React from 'react';
import { Screen, Stack, Text, Button } from '@visual-rn/core';

/**
 * @vrn-bindings
 * state: {
 *   message: string,
 *   count: number,
 * }
 * actions: {
 *   handlePress: function,
 * }
 */
export default function HomeView({ state, actions }) {
  return (
    <Screen safe padding={4}>
      <Stack spacing={2}>
        <Text color="primary">{state.message}</Text>
        <Button onPress={actions.handlePress} variant="solid" disabled={false} />
      </Stack>
    </Screen>
  );
}
"#;

    let generated = assert_fixed_point(source);

    // Semantics carry through the regeneration
    let reparsed = parse(&generated).unwrap();
    assert_eq!(reparsed.tree.name, "Screen");
    assert_eq!(
        reparsed.tree.get_prop("safe"),
        Some(&PropValue::BooleanShorthand)
    );
    assert_eq!(reparsed.bindings.state.len(), 2);
    assert_eq!(reparsed.bindings.actions.len(), 1);
}

#[test]
fn test_boolean_shorthand_round_trip() {
    // `disabled={true}` regenerates as bare `disabled`; the two compare equal
    let source = r#"export default function V() {
  return <Button disabled={true} />;
}"#;

    let first = parse(source).unwrap();
    let generated = generate(&first.tree, &first.bindings).unwrap();
    assert!(generated.contains("<Button disabled />"));

    let reparsed = parse(&generated).unwrap();
    assert_eq!(
        reparsed.tree.get_prop("disabled"),
        first.tree.get_prop("disabled")
    );
}

#[test]
fn test_raw_expressions_stabilize() {
    let source = r#"export default function V() {
  return <Grid columns={[1,2,3]} style={theme.spacing + 4} />;
}"#;

    let generated = assert_fixed_point(source);
    assert!(generated.contains("columns={[1, 2, 3]}"));
    assert!(generated.contains("style={theme.spacing + 4}"));
}

#[test]
fn test_empty_root_becomes_stable_fragment() {
    let first = parse("export default function V() {}").unwrap();
    assert_eq!(first.tree.kind, NodeKind::Empty);

    let gen1 = generate(&first.tree, &first.bindings).unwrap();
    let second = parse(&gen1).unwrap();
    assert_eq!(second.tree.kind, NodeKind::Fragment);
    assert!(second.tree.children.is_empty());

    let gen2 = generate(&second.tree, &second.bindings).unwrap();
    assert_eq!(gen1, gen2);
}

#[test]
fn test_fragment_round_trip() {
    assert_fixed_point(
        r#"export default function V({ state, actions }) {
  return (
    <>
      <Text color="muted" />
      <Divider />
    </>
  );
}"#,
    );
}

#[test]
fn test_deep_nesting_round_trip() {
    assert_fixed_point(
        r#"export default function V({ state, actions }) {
  return (
    <Screen>
      <Card>
        <Stack spacing={1}>
          <Avatar size={48} source={state.avatarUrl} />
          <Text bold>{state.userName}</Text>
          <HStack>
            <Button onPress={actions.follow} variant="solid" />
            <Button onPress={actions.message} variant="ghost" />
          </HStack>
        </Stack>
      </Card>
    </Screen>
  );
}"#,
    );
}
