//! Converts a dashboard's id-addressed widgets and data tables into a portable,
//! index-addressed form, and back.

use crate::backend::{CostDataSourceLookup, DataTableSource, ErrorReporter, NoCostDataSources};
use crate::model::{
    Arity, DashboardLayout, DataTableRecord, DataType, NOT_FOUND_INDEX, SharedDashboardLayout,
    SharedDataTableInfo, SharedWidgetInfo, UNSAVED_DATA_TABLE_PREFIX, WidgetRecord,
};
use ahash::AHashMap;
use futures::future::join_all;
use itertools::Itertools;
use serde_json::Value;

pub mod import;

pub use import::{
    creation_order, instantiate_data_tables, resolve_shared_reference, restore_cost_data_source,
};

/// Source type of raw tables fed by a cost data source.
pub const COST_SOURCE_TYPE: &str = "COST";

static NO_COST_DATA_SOURCES: NoCostDataSources = NoCostDataSources;

/// Produces [`SharedDashboardLayout`]s for a dashboard.
///
/// Data tables are fetched per widget, concurrently. A widget whose fetch fails is
/// reported and exported without data tables; it never fails the export.
pub struct SharedDashboardExporter<'a, S: DataTableSource + ?Sized> {
    source: &'a S,
    cost_lookup: &'a dyn CostDataSourceLookup,
    error_reporter: Option<ErrorReporter>,
    unsaved_prefix: String,
}

pub struct SharedDashboardExporterBuilder<'a, S: DataTableSource + ?Sized> {
    exporter: SharedDashboardExporter<'a, S>,
}

impl<'a, S: DataTableSource + ?Sized> SharedDashboardExporterBuilder<'a, S> {
    /// Cost data source lookup used to rewrite data source ids into plugin ids.
    pub fn with_cost_lookup(mut self, lookup: &'a dyn CostDataSourceLookup) -> Self {
        self.exporter.cost_lookup = lookup;
        self
    }

    /// Called with the widget id and error of every failed fetch.
    pub fn with_error_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.exporter.error_reporter = Some(reporter);
        self
    }

    pub fn with_unsaved_prefix(mut self, prefix: &str) -> Self {
        self.exporter.unsaved_prefix = prefix.to_string();
        self
    }

    pub fn build(self) -> SharedDashboardExporter<'a, S> {
        self.exporter
    }
}

impl<'a, S: DataTableSource + ?Sized> SharedDashboardExporter<'a, S> {
    pub fn builder(source: &'a S) -> SharedDashboardExporterBuilder<'a, S> {
        SharedDashboardExporterBuilder {
            exporter: Self {
                source,
                cost_lookup: &NO_COST_DATA_SOURCES,
                error_reporter: None,
                unsaved_prefix: UNSAVED_DATA_TABLE_PREFIX.to_string(),
            },
        }
    }

    /// Exports every layout, keeping layout and widget order.
    ///
    /// Widget ids that do not match any widget in `widgets` are dropped.
    #[tracing::instrument(skip_all, fields(layouts = layouts.len(), widgets = widgets.len()))]
    pub async fn share_layouts(
        &self,
        layouts: &[DashboardLayout],
        widgets: &[WidgetRecord],
    ) -> Vec<SharedDashboardLayout> {
        let data_tables = self.fetch_widget_data_tables(layouts).await;
        let widgets_by_id: AHashMap<&str, &WidgetRecord> = widgets
            .iter()
            .map(|w| (w.widget_id.as_str(), w))
            .collect();

        layouts
            .iter()
            .map(|layout| SharedDashboardLayout {
                widgets: layout
                    .widgets
                    .iter()
                    .filter_map(|id| widgets_by_id.get(id.as_str()))
                    .map(|widget| {
                        let records = data_tables
                            .get(&widget.widget_id)
                            .map(Vec::as_slice)
                            .unwrap_or_default();
                        share_widget(widget, records)
                    })
                    .collect(),
            })
            .collect()
    }

    /// Fetches the data tables of every distinct widget placed in `layouts`.
    ///
    /// Failed fetches are left out of the map. Cost data sources are rewritten to
    /// plugin ids and unsaved tables are dropped.
    pub async fn fetch_widget_data_tables(
        &self,
        layouts: &[DashboardLayout],
    ) -> AHashMap<String, Vec<DataTableRecord>> {
        let widget_ids = layouts
            .iter()
            .flat_map(|layout| layout.widgets.iter())
            .filter(|id| !id.is_empty())
            .unique();

        join_all(widget_ids.map(|id| self.fetch_one(id)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn fetch_one(&self, widget_id: &str) -> Option<(String, Vec<DataTableRecord>)> {
        match self.source.list_data_tables(widget_id).await {
            Ok(records) => {
                let mut records: Vec<DataTableRecord> = records
                    .into_iter()
                    .filter(|r| !r.is_unsaved(&self.unsaved_prefix))
                    .collect();
                rewrite_cost_data_source(&mut records, self.cost_lookup);
                Some((widget_id.to_string(), records))
            }
            Err(error) => {
                tracing::warn!(%widget_id, %error, "failed to fetch widget data tables, exporting without them");
                if let Some(reporter) = &self.error_reporter {
                    reporter(widget_id, &error);
                }
                None
            }
        }
    }
}

/// Replaces the `data_source_id` of cost-fed raw tables with the data source's `plugin_id`.
///
/// Plugin ids are stable across domains, data source ids are not.
pub fn rewrite_cost_data_source(
    records: &mut [DataTableRecord],
    lookup: &dyn CostDataSourceLookup,
) {
    for record in records.iter_mut().filter(|r| is_cost_table(r)) {
        let Some(Value::Object(cost)) = record.options.get_mut(COST_SOURCE_TYPE) else {
            continue;
        };
        let data_source_id = cost
            .remove("data_source_id")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        match lookup.plugin_id(&data_source_id) {
            Some(plugin_id) => {
                cost.insert("plugin_id".to_string(), Value::String(plugin_id));
            }
            None => {
                tracing::debug!(data_table_id = %record.id, %data_source_id, "no plugin known for cost data source");
                cost.remove("plugin_id");
            }
        }
    }
}

pub(crate) fn is_cost_table(record: &DataTableRecord) -> bool {
    record.data_type == DataType::Raw && record.source_type.as_deref() == Some(COST_SOURCE_TYPE)
}

/// Converts one widget's data tables to their shared form.
///
/// Parent references become positions within `records`; a parent that is not in
/// `records` becomes `-1`. The second value is the position of `selected`, if any.
pub fn share_data_tables(
    records: &[DataTableRecord],
    selected: Option<&str>,
) -> (Vec<SharedDataTableInfo>, Option<usize>) {
    let mut positions: AHashMap<&str, usize> = AHashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        positions.entry(record.id.as_str()).or_insert(i);
    }
    let position_of = |value: &Value| -> Value {
        let index = value
            .as_str()
            .and_then(|id| positions.get(id))
            .map_or(NOT_FOUND_INDEX, |&i| i as i64);
        Value::from(index)
    };

    let shared = records
        .iter()
        .map(|record| {
            let mut options = record.options.clone();
            if let Some(operator) = record.operator_kind() {
                let reference = options
                    .get_mut(operator.as_str())
                    .and_then(Value::as_object_mut)
                    .and_then(|o| o.get_mut(operator.reference_key()));
                match (operator.arity(), reference) {
                    (Arity::Binary, Some(Value::Array(ids))) => {
                        for id in ids.iter_mut() {
                            *id = position_of(id);
                        }
                    }
                    (Arity::Unary, Some(id)) => *id = position_of(id),
                    _ => {}
                }
            }
            SharedDataTableInfo {
                name: record.name.clone(),
                data_type: record.data_type,
                source_type: record.source_type.clone(),
                operator: record.operator.clone(),
                options,
            }
        })
        .collect();

    let selected_index = selected.and_then(|id| positions.get(id).copied());
    (shared, selected_index)
}

/// Converts a widget and its data tables to the shared form.
///
/// An unresolved selection is exported as position `0`.
pub fn share_widget(widget: &WidgetRecord, records: &[DataTableRecord]) -> SharedWidgetInfo {
    let (data_tables, selected) = share_data_tables(records, widget.data_table_id.as_deref());
    SharedWidgetInfo {
        widget_type: widget.widget_type.clone(),
        size: widget.size.clone(),
        options: widget.options.clone(),
        data_tables,
        data_table_id: selected.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cost_table_gets_plugin_id() {
        let mut record = DataTableRecord::raw("dt-1").with_source_type(COST_SOURCE_TYPE);
        record
            .options
            .insert("COST".into(), json!({ "data_source_id": "ds-1", "data_key": "cost" }));
        let lookup: AHashMap<String, String> =
            [("ds-1".to_string(), "plugin-aws".to_string())].into_iter().collect();

        let mut records = vec![record];
        rewrite_cost_data_source(&mut records, &lookup);
        assert_eq!(
            records[0].options["COST"],
            json!({ "data_key": "cost", "plugin_id": "plugin-aws" })
        );
    }
}
