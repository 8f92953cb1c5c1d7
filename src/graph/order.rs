use super::DependencyGraph;
use ahash::AHashMap;
use std::collections::VecDeque;

/// Topological order of the graph: every table appears after all of its parents.
///
/// Tables with no parents come first, in the order they were discovered. Tables that
/// sit on a cycle, or downstream of one, never reach an in-degree of zero and are
/// left out of the result.
pub fn execution_order(graph: &DependencyGraph) -> Vec<String> {
    let mut in_degree: AHashMap<&str, usize> = AHashMap::new();
    for node in graph.iter() {
        for child in &node.children {
            *in_degree.entry(child.as_str()).or_default() += 1;
        }
    }

    let mut queue: VecDeque<&str> = graph
        .iter()
        .map(|node| node.data_table_id.as_str())
        .filter(|id| !in_degree.contains_key(id))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        for child in graph.children(id) {
            if let Some(degree) = in_degree.get_mut(child.as_str()) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(child);
                }
            }
        }
    }
    order
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Finds a cycle reachable by following child links from `start`.
///
/// The returned path begins and ends with the same id, e.g. `["a", "b", "a"]`.
pub fn find_cycle_from(graph: &DependencyGraph, start: &str) -> Option<Vec<String>> {
    let mut marks = AHashMap::new();
    search(graph, start, &mut marks)
}

/// Finds any cycle in the graph.
pub fn find_cycle(graph: &DependencyGraph) -> Option<Vec<String>> {
    let mut marks = AHashMap::new();
    graph
        .iter()
        .find_map(|node| search(graph, &node.data_table_id, &mut marks))
}

fn search<'g>(
    graph: &'g DependencyGraph,
    start: &'g str,
    marks: &mut AHashMap<&'g str, Mark>,
) -> Option<Vec<String>> {
    if marks.contains_key(start) {
        return None;
    }
    marks.insert(start, Mark::OnPath);
    let mut path: Vec<(&'g str, usize)> = vec![(start, 0)];

    while let Some(&(node, next)) = path.last() {
        let Some(child) = graph.children(node).get(next) else {
            marks.insert(node, Mark::Done);
            path.pop();
            continue;
        };
        if let Some(top) = path.last_mut() {
            top.1 += 1;
        }

        let child = child.as_str();
        match marks.get(child) {
            Some(Mark::OnPath) => {
                let from = path.iter().position(|(id, _)| *id == child).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[from..].iter().map(|(id, _)| id.to_string()).collect();
                cycle.push(child.to_string());
                return Some(cycle);
            }
            Some(Mark::Done) => {}
            None => {
                marks.insert(child, Mark::OnPath);
                path.push((child, 0));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataTableRecord, Operator};
    use serde_json::json;

    fn unary(id: &str, parent: &str) -> DataTableRecord {
        DataTableRecord::transformed(id, Operator::Eval, json!({ "data_table_id": parent }))
    }

    #[test]
    fn order_puts_parents_first() {
        let records = vec![
            unary("c", "b"),
            unary("b", "a"),
            DataTableRecord::raw("a"),
        ];
        let graph = DependencyGraph::build(&records);
        assert_eq!(execution_order(&graph), vec!["a", "b", "c"]);
    }

    #[test]
    fn cycle_is_reported_as_closed_path() {
        let records = vec![unary("a", "b"), unary("b", "a")];
        let graph = DependencyGraph::build(&records);
        let cycle = find_cycle_from(&graph, "a").expect("cycle");
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 3);
        assert!(execution_order(&graph).is_empty());
    }
}
