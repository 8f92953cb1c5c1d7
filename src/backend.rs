use crate::error::BoxError;
use crate::model::{DataTableRecord, DataTableUpdate};
use ahash::AHashMap;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// The persistence layer that owns data tables.
///
/// Timeouts and cancellation belong to the implementation; callers await each
/// operation until it resolves.
#[async_trait]
pub trait DataTableSource: Send + Sync {
    /// Lists every data table persisted for a widget.
    async fn list_data_tables(&self, widget_id: &str) -> Result<Vec<DataTableRecord>, BoxError>;

    /// Re-submits a data table definition and returns the recomputed record.
    async fn update_data_table(
        &self,
        data_table_id: &str,
        update: DataTableUpdate,
    ) -> Result<DataTableRecord, BoxError>;
}

#[async_trait]
impl<T: DataTableSource + ?Sized> DataTableSource for Arc<T> {
    async fn list_data_tables(&self, widget_id: &str) -> Result<Vec<DataTableRecord>, BoxError> {
        (**self).list_data_tables(widget_id).await
    }

    async fn update_data_table(
        &self,
        data_table_id: &str,
        update: DataTableUpdate,
    ) -> Result<DataTableRecord, BoxError> {
        (**self).update_data_table(data_table_id, update).await
    }
}

/// Resolves a cost data source id to the plugin id it was installed from.
pub trait CostDataSourceLookup: Send + Sync {
    fn plugin_id(&self, data_source_id: &str) -> Option<String>;
}

impl CostDataSourceLookup for AHashMap<String, String> {
    fn plugin_id(&self, data_source_id: &str) -> Option<String> {
        self.get(data_source_id).cloned()
    }
}

impl CostDataSourceLookup for HashMap<String, String> {
    fn plugin_id(&self, data_source_id: &str) -> Option<String> {
        self.get(data_source_id).cloned()
    }
}

impl CostDataSourceLookup for BTreeMap<String, String> {
    fn plugin_id(&self, data_source_id: &str) -> Option<String> {
        self.get(data_source_id).cloned()
    }
}

/// A lookup that knows no data sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCostDataSources;

impl CostDataSourceLookup for NoCostDataSources {
    fn plugin_id(&self, _data_source_id: &str) -> Option<String> {
        None
    }
}

/// Receives errors that were isolated instead of propagated.
pub type ErrorReporter = Arc<dyn Fn(&str, &BoxError) + Send + Sync>;
