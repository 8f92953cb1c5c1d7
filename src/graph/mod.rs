//! The dependency graph between a widget's data tables.
//!
//! The graph is an arena of [`DataTableReference`] nodes addressed by data table id.
//! It is rebuilt from the full list of a widget's data tables whenever it is needed
//! and is never mutated afterwards.

use crate::model::{DataTableRecord, UNSAVED_DATA_TABLE_PREFIX};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

mod builder;
mod order;

pub use builder::GraphBuilder;
pub use order::{execution_order, find_cycle, find_cycle_from};

/// Parent and child links of a single data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTableReference {
    pub data_table_id: String,
    /// Zero, one or two parents. Binary operators keep left before right.
    pub parents: Vec<String>,
    /// Every table whose operator reads from this one, in discovery order.
    pub children: Vec<String>,
}

impl DataTableReference {
    fn new(data_table_id: &str) -> Self {
        Self {
            data_table_id: data_table_id.to_string(),
            parents: Vec::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<DataTableReference>,
    index: AHashMap<String, usize>,
}

impl DependencyGraph {
    /// Builds the graph for `records`, skipping unsaved placeholder tables.
    pub fn build(records: &[DataTableRecord]) -> Self {
        GraphBuilder::new()
            .with_unsaved_prefix(UNSAVED_DATA_TABLE_PREFIX)
            .build(records)
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&DataTableReference> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Parents of `id`; empty for unknown ids.
    pub fn parents(&self, id: &str) -> &[String] {
        self.get(id)
            .map(|node| node.parents.as_slice())
            .unwrap_or_default()
    }

    /// Direct children of `id`; empty for unknown ids.
    pub fn children(&self, id: &str) -> &[String] {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Nodes in the order they were first seen while building.
    pub fn iter(&self) -> impl Iterator<Item = &DataTableReference> {
        self.nodes.iter()
    }

    /// Every transitive child of `id`, each listed once, breadth first.
    pub fn descendants(&self, id: &str) -> Vec<&str> {
        let mut seen = AHashSet::new();
        let mut queue: VecDeque<&str> = self.children(id).iter().map(String::as_str).collect();
        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            if current == id || !seen.insert(current) {
                continue;
            }
            result.push(current);
            queue.extend(self.children(current).iter().map(String::as_str));
        }
        result
    }

    fn entry(&mut self, id: &str) -> &mut DataTableReference {
        let next = self.nodes.len();
        let slot = *self.index.entry(id.to_string()).or_insert(next);
        if slot == next {
            self.nodes.push(DataTableReference::new(id));
        }
        &mut self.nodes[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operator;
    use serde_json::json;

    #[test]
    fn entry_is_created_once() {
        let mut graph = DependencyGraph::default();
        graph.entry("a").children.push("b".to_string());
        graph.entry("a");
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.children("a"), ["b".to_string()]);
    }

    #[test]
    fn descendants_visit_diamond_once() {
        let records = vec![
            DataTableRecord::raw("a"),
            DataTableRecord::transformed("b", Operator::Eval, json!({ "data_table_id": "a" })),
            DataTableRecord::transformed("c", Operator::Query, json!({ "data_table_id": "a" })),
            DataTableRecord::transformed("d", Operator::Join, json!({ "data_tables": ["b", "c"] })),
        ];
        let graph = DependencyGraph::build(&records);
        assert_eq!(graph.descendants("a"), vec!["b", "c", "d"]);
    }
}
