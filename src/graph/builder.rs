use super::DependencyGraph;
use crate::model::{DataTableRecord, DataType, UNSAVED_DATA_TABLE_PREFIX};

/// Builds a [`DependencyGraph`] from a flat list of data tables.
///
/// Building never fails. A transformed table whose operator is unknown, or whose
/// options lack the expected reference, becomes a node without parents.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    unsaved_prefix: String,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            unsaved_prefix: UNSAVED_DATA_TABLE_PREFIX.to_string(),
        }
    }

    /// Sets the id prefix that marks local, not yet persisted tables.
    pub fn with_unsaved_prefix(mut self, prefix: &str) -> Self {
        self.unsaved_prefix = prefix.to_string();
        self
    }

    pub fn build(&self, records: &[DataTableRecord]) -> DependencyGraph {
        let mut graph = DependencyGraph::default();

        for record in records
            .iter()
            .filter(|r| !r.is_unsaved(&self.unsaved_prefix))
        {
            graph.entry(&record.id);
            if record.data_type != DataType::Transformed {
                continue;
            }

            let parents = record.parent_ids();
            if parents.is_empty() {
                tracing::debug!(
                    data_table_id = %record.id,
                    operator = ?record.operator,
                    "transformed data table has no resolvable parent reference"
                );
                continue;
            }

            for parent in &parents {
                graph.entry(parent).children.push(record.id.clone());
            }
            graph.entry(&record.id).parents = parents.iter().map(|p| p.to_string()).collect();
        }

        tracing::debug!(nodes = graph.len(), "built data table dependency graph");
        graph
    }
}
