use crate::backend::DataTableSource;
use crate::error::{BoxError, FixtureError};
use crate::model::{DashboardLayout, DataTableRecord, DataTableUpdate, WidgetRecord};
use crate::sanitize::WidgetConfig;
use ahash::AHashSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::sync::Mutex;

/// A dashboard snapshot in JSON, as consumed by the CLI and produced by `fixture-gen`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DashboardFixture {
    #[serde(default)]
    pub layouts: Vec<DashboardLayout>,
    #[serde(default)]
    pub widgets: Vec<WidgetRecord>,
    /// Data tables keyed by widget id.
    #[serde(default)]
    pub data_tables: BTreeMap<String, Vec<DataTableRecord>>,
    /// Cost data source id to plugin id.
    #[serde(default)]
    pub cost_data_sources: BTreeMap<String, String>,
    /// Widget configs keyed by widget type.
    #[serde(default)]
    pub widget_configs: BTreeMap<String, WidgetConfig>,
}

impl DashboardFixture {
    pub fn from_file(path: &str) -> Result<Self, FixtureError> {
        let content = fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn widget(&self, widget_id: &str) -> Option<&WidgetRecord> {
        self.widgets.iter().find(|w| w.widget_id == widget_id)
    }

    pub fn widget_data_tables(&self, widget_id: &str) -> &[DataTableRecord] {
        self.data_tables
            .get(widget_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// A [`DataTableSource`] backed by memory.
///
/// Updates are applied to the stored records and logged, and individual widgets or
/// data tables can be made to fail.
#[derive(Debug, Default)]
pub struct InMemorySource {
    data_tables: Mutex<BTreeMap<String, Vec<DataTableRecord>>>,
    failing_widgets: AHashSet<String>,
    failing_updates: AHashSet<String>,
    update_log: Mutex<Vec<String>>,
}

impl InMemorySource {
    pub fn new(data_tables: BTreeMap<String, Vec<DataTableRecord>>) -> Self {
        Self {
            data_tables: Mutex::new(data_tables),
            ..Self::default()
        }
    }

    pub fn from_fixture(fixture: &DashboardFixture) -> Self {
        Self::new(fixture.data_tables.clone())
    }

    /// Makes `list_data_tables` fail for `widget_id`.
    pub fn with_failing_widget(mut self, widget_id: &str) -> Self {
        self.failing_widgets.insert(widget_id.to_string());
        self
    }

    /// Makes `update_data_table` fail for `data_table_id`.
    pub fn with_failing_update(mut self, data_table_id: &str) -> Self {
        self.failing_updates.insert(data_table_id.to_string());
        self
    }

    /// Ids passed to `update_data_table`, in call order.
    pub fn update_log(&self) -> Vec<String> {
        self.update_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataTableSource for InMemorySource {
    async fn list_data_tables(&self, widget_id: &str) -> Result<Vec<DataTableRecord>, BoxError> {
        if self.failing_widgets.contains(widget_id) {
            return Err(format!("listing data tables of widget '{widget_id}' failed").into());
        }
        let tables = self
            .data_tables
            .lock()
            .map_err(|e| format!("data table store poisoned: {e}"))?;
        Ok(tables.get(widget_id).cloned().unwrap_or_default())
    }

    async fn update_data_table(
        &self,
        data_table_id: &str,
        update: DataTableUpdate,
    ) -> Result<DataTableRecord, BoxError> {
        if let Ok(mut log) = self.update_log.lock() {
            log.push(data_table_id.to_string());
        }
        if self.failing_updates.contains(data_table_id) {
            return Err(format!("update of data table '{data_table_id}' was rejected").into());
        }

        let mut tables = self
            .data_tables
            .lock()
            .map_err(|e| format!("data table store poisoned: {e}"))?;
        let record = tables
            .values_mut()
            .flat_map(|records| records.iter_mut())
            .find(|r| r.id == data_table_id)
            .ok_or_else(|| format!("data table '{data_table_id}' not found"))?;
        record.name = update.name;
        record.options = update.options;
        Ok(record.clone())
    }
}
