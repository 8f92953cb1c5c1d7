//! Propagates a data table change to every table derived from it.

use crate::backend::DataTableSource;
use crate::error::{BoxError, CascadeError};
use crate::graph::{DependencyGraph, GraphBuilder, find_cycle_from};
use crate::model::DataTableUpdate;

mod cache;

pub use cache::DataTableCache;

/// What the cascade does when the update of one table fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole cascade and return the error.
    #[default]
    Abort,
    /// Record the failure, skip that table's subtree and continue with its siblings.
    IsolateSiblings,
}

/// A table whose update failed under [`FailurePolicy::IsolateSiblings`].
#[derive(Debug)]
pub struct CascadeFailure {
    pub data_table_id: String,
    pub error: BoxError,
}

/// Outcome of a cascade run.
#[derive(Debug, Default)]
pub struct CascadeReport {
    /// Tables re-submitted successfully, in the order the updates were issued.
    pub updated: Vec<String>,
    /// Tables present in the graph but missing from the cache.
    pub skipped: Vec<String>,
    pub failed: Vec<CascadeFailure>,
}

impl CascadeReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Re-submits every descendant of a changed data table so the backend recomputes it.
///
/// Updates are strictly sequential: a table's update resolves before any of its
/// children is touched, and a child's whole subtree finishes before the next
/// sibling starts. The dependency graph is captured once, when the cascade starts.
pub struct CascadeUpdater<'a, S: DataTableSource + ?Sized> {
    source: &'a S,
    policy: FailurePolicy,
    graph_builder: GraphBuilder,
}

pub struct CascadeUpdaterBuilder<'a, S: DataTableSource + ?Sized> {
    source: &'a S,
    policy: FailurePolicy,
    graph_builder: GraphBuilder,
}

impl<'a, S: DataTableSource + ?Sized> CascadeUpdaterBuilder<'a, S> {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_graph_builder(mut self, graph_builder: GraphBuilder) -> Self {
        self.graph_builder = graph_builder;
        self
    }

    pub fn build(self) -> CascadeUpdater<'a, S> {
        CascadeUpdater {
            source: self.source,
            policy: self.policy,
            graph_builder: self.graph_builder,
        }
    }
}

impl<'a, S: DataTableSource + ?Sized> CascadeUpdater<'a, S> {
    pub fn builder(source: &'a S) -> CascadeUpdaterBuilder<'a, S> {
        CascadeUpdaterBuilder {
            source,
            policy: FailurePolicy::default(),
            graph_builder: GraphBuilder::new(),
        }
    }

    pub fn new(source: &'a S) -> Self {
        Self::builder(source).build()
    }

    /// Cascades a change of `changed_id` through the tables cached in `cache`.
    ///
    /// A table with no children resolves immediately without any update call.
    /// The reachable subgraph is checked for cycles before the first update is sent.
    pub async fn cascade_update(
        &self,
        cache: &mut DataTableCache,
        changed_id: &str,
    ) -> Result<CascadeReport, CascadeError> {
        let graph = self.graph_builder.build(cache.records());
        self.cascade_update_in(&graph, cache, changed_id).await
    }

    /// Like [`cascade_update`](Self::cascade_update), but walks a graph the caller
    /// already built, e.g. from a freshly fetched table list.
    ///
    /// Tables in `graph` that `cache` does not hold are reported as skipped; their
    /// own dependents are still cascaded.
    #[tracing::instrument(skip(self, graph, cache), fields(policy = ?self.policy))]
    pub async fn cascade_update_in(
        &self,
        graph: &DependencyGraph,
        cache: &mut DataTableCache,
        changed_id: &str,
    ) -> Result<CascadeReport, CascadeError> {
        if let Some(cycle) = find_cycle_from(graph, changed_id) {
            return Err(CascadeError::CycleDetected { cycle });
        }

        let mut report = CascadeReport::default();
        let mut pending: Vec<String> = graph.children(changed_id).iter().rev().cloned().collect();

        while let Some(data_table_id) = pending.pop() {
            let Some(current) = cache.get(&data_table_id) else {
                tracing::warn!(%data_table_id, "dependent data table is not cached, skipping update");
                report.skipped.push(data_table_id.clone());
                pending.extend(graph.children(&data_table_id).iter().rev().cloned());
                continue;
            };
            let update = DataTableUpdate::from(current);

            match self.source.update_data_table(&data_table_id, update).await {
                Ok(refreshed) => {
                    tracing::debug!(%data_table_id, "refreshed dependent data table");
                    if !cache.replace(refreshed) {
                        tracing::warn!(%data_table_id, "updated data table came back with an unknown id");
                    }
                    pending.extend(graph.children(&data_table_id).iter().rev().cloned());
                    report.updated.push(data_table_id);
                }
                Err(source) => match self.policy {
                    FailurePolicy::Abort => {
                        return Err(CascadeError::UpdateFailed {
                            data_table_id,
                            source,
                        });
                    }
                    FailurePolicy::IsolateSiblings => {
                        tracing::warn!(%data_table_id, error = %source, "data table update failed, skipping its dependents");
                        report.failed.push(CascadeFailure {
                            data_table_id,
                            error: source,
                        });
                    }
                },
            }
        }

        Ok(report)
    }
}
