mod common;

use common::*;
use serde_json::json;
use tablegraph::graph::{find_cycle, find_cycle_from};
use tablegraph::prelude::*;

#[test]
fn test_binary_operator_links_both_parents() {
    let graph = DependencyGraph::build(&concat_tables());

    assert_eq!(graph.len(), 3);
    assert_eq!(graph.parents("dt-3"), ["dt-1".to_string(), "dt-2".to_string()]);
    assert_eq!(graph.children("dt-1"), ["dt-3".to_string()]);
    assert_eq!(graph.children("dt-2"), ["dt-3".to_string()]);
    assert!(graph.parents("dt-1").is_empty());
}

#[test]
fn test_links_are_symmetric() {
    let graph = DependencyGraph::build(&branching_tables());

    for node in graph.iter() {
        for parent in &node.parents {
            assert!(graph.children(parent).contains(&node.data_table_id));
        }
        for child in &node.children {
            assert!(graph.parents(child).contains(&node.data_table_id));
        }
    }
}

#[test]
fn test_children_keep_discovery_order() {
    let graph = DependencyGraph::build(&branching_tables());

    assert_eq!(graph.children("root"), ["left".to_string(), "right".to_string()]);
    assert_eq!(
        graph.children("left"),
        ["left-leaf".to_string(), "joined".to_string()]
    );
}

#[test]
fn test_parent_declared_after_child() {
    let records = vec![
        unary("b", Operator::Pivot, "a"),
        DataTableRecord::raw("a"),
    ];
    let graph = DependencyGraph::build(&records);

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.children("a"), ["b".to_string()]);
}

#[test]
fn test_unknown_parent_gets_its_own_node() {
    let records = vec![unary("b", Operator::Eval, "gone")];
    let graph = DependencyGraph::build(&records);

    assert!(graph.contains("gone"));
    assert_eq!(graph.children("gone"), ["b".to_string()]);
}

#[test]
fn test_degenerate_transformed_tables_have_no_parents() {
    let mut unknown_operator = DataTableRecord::raw("x");
    unknown_operator.data_type = DataType::Transformed;
    unknown_operator.operator = Some("SORT".to_string());

    // Options stored under a different key than the operator name.
    let mut misplaced = unary("misplaced", Operator::Eval, "a");
    misplaced.options = json!({ "QUERY": { "data_table_id": "a" } })
        .as_object()
        .cloned()
        .unwrap();

    let records = vec![
        DataTableRecord::raw("a"),
        // A JOIN with only one side filled in.
        binary("half", Operator::Join, "a", ""),
        misplaced,
        unknown_operator,
    ];
    let graph = DependencyGraph::build(&records);

    assert_eq!(graph.len(), 4);
    for id in ["half", "misplaced", "x"] {
        assert!(graph.contains(id));
        assert!(graph.parents(id).is_empty(), "{id} should have no parents");
    }
    assert!(graph.children("a").is_empty());
}

#[test]
fn test_unsaved_tables_are_ignored() {
    let records = vec![
        DataTableRecord::raw("a"),
        unary("UNSAVED-1", Operator::Eval, "a"),
        DataTableRecord::raw(""),
    ];
    let graph = DependencyGraph::build(&records);

    assert_eq!(graph.len(), 1);
    assert!(!graph.contains("UNSAVED-1"));
    assert!(graph.children("a").is_empty());
}

#[test]
fn test_custom_unsaved_prefix() {
    let records = vec![
        DataTableRecord::raw("a"),
        unary("draft:b", Operator::Eval, "a"),
        unary("UNSAVED-c", Operator::Eval, "a"),
    ];
    let graph = DependencyGraph::builder()
        .with_unsaved_prefix("draft:")
        .build(&records);

    assert!(!graph.contains("draft:b"));
    assert_eq!(graph.children("a"), ["UNSAVED-c".to_string()]);
}

#[test]
fn test_unknown_ids_have_no_links() {
    let graph = DependencyGraph::build(&chain_tables());

    assert!(graph.get("missing").is_none());
    assert!(graph.parents("missing").is_empty());
    assert!(graph.children("missing").is_empty());
    assert!(graph.descendants("missing").is_empty());
}

#[test]
fn test_descendants_are_transitive() {
    let graph = DependencyGraph::build(&branching_tables());

    assert_eq!(
        graph.descendants("root"),
        vec!["left", "right", "left-leaf", "joined"]
    );
    assert!(graph.descendants("left-leaf").is_empty());
}

#[test]
fn test_execution_order_respects_every_edge() {
    let graph = DependencyGraph::build(&branching_tables());
    let order = execution_order(&graph);

    assert_eq!(order.len(), graph.len());
    let position = |id: &str| order.iter().position(|o| o == id).unwrap();
    for node in graph.iter() {
        for child in &node.children {
            assert!(position(&node.data_table_id) < position(child));
        }
    }
}

#[test]
fn test_cycle_detection() {
    let acyclic = DependencyGraph::build(&branching_tables());
    assert!(find_cycle(&acyclic).is_none());
    assert!(find_cycle_from(&acyclic, "root").is_none());

    let records = vec![
        DataTableRecord::raw("start"),
        binary("a", Operator::Join, "start", "c"),
        unary("b", Operator::Eval, "a"),
        unary("c", Operator::Query, "b"),
    ];
    let cyclic = DependencyGraph::build(&records);

    let cycle = find_cycle_from(&cyclic, "start").expect("cycle through a, b, c");
    assert_eq!(cycle, vec!["a", "b", "c", "a"]);
    assert!(find_cycle(&cyclic).is_some());
}

#[test]
fn test_self_reference_is_a_cycle() {
    let records = vec![unary("a", Operator::Eval, "a")];
    let graph = DependencyGraph::build(&records);

    assert_eq!(find_cycle(&graph), Some(vec!["a".to_string(), "a".to_string()]));
}
