//! Common test utilities for building data tables, widgets and configs.
use serde_json::json;
use std::collections::BTreeMap;
use tablegraph::prelude::*;

#[allow(dead_code)]
pub fn unary(id: &str, operator: Operator, parent: &str) -> DataTableRecord {
    DataTableRecord::transformed(id, operator, json!({ "data_table_id": parent }))
}

#[allow(dead_code)]
pub fn binary(id: &str, operator: Operator, left: &str, right: &str) -> DataTableRecord {
    DataTableRecord::transformed(id, operator, json!({ "data_tables": [left, right] }))
}

/// Two raw tables and a CONCAT of both.
///
/// `dt-1`, `dt-2` -> `dt-3`
#[allow(dead_code)]
pub fn concat_tables() -> Vec<DataTableRecord> {
    vec![
        DataTableRecord::raw("dt-1").with_name("Cost"),
        DataTableRecord::raw("dt-2").with_name("Usage"),
        binary("dt-3", Operator::Concat, "dt-1", "dt-2").with_name("Cost and Usage"),
    ]
}

/// A straight chain: `a` -> `b` -> `c`.
#[allow(dead_code)]
pub fn chain_tables() -> Vec<DataTableRecord> {
    vec![
        DataTableRecord::raw("a"),
        unary("b", Operator::Eval, "a"),
        unary("c", Operator::Query, "b"),
    ]
}

/// `root` feeds `left` and `right`; `left` feeds `left-leaf`; both sides meet in `joined`.
#[allow(dead_code)]
pub fn branching_tables() -> Vec<DataTableRecord> {
    vec![
        DataTableRecord::raw("root"),
        unary("left", Operator::Eval, "root"),
        unary("right", Operator::AddLabels, "root"),
        unary("left-leaf", Operator::ValueMapping, "left"),
        binary("joined", Operator::Join, "left", "right"),
    ]
}

#[allow(dead_code)]
pub fn source_for(widget_id: &str, records: Vec<DataTableRecord>) -> tablegraph::fixture::InMemorySource {
    let mut tables = BTreeMap::new();
    tables.insert(widget_id.to_string(), records);
    tablegraph::fixture::InMemorySource::new(tables)
}

/// A `table` widget config with a single-select `groupBy` and a multi-select `dataField`.
#[allow(dead_code)]
pub fn table_widget_configs() -> BTreeMap<String, WidgetConfig> {
    let config = WidgetConfig::new("table")
        .with_required(
            "groupBy",
            FieldOptions {
                data_target: Some(DataTarget::LabelsInfo),
                default_max_count: Some(10),
                ..FieldOptions::default()
            },
        )
        .with_required(
            "dataField",
            FieldOptions {
                multi_selectable: true,
                ..FieldOptions::default()
            },
        )
        .with_optional("customTableColumnWidth", FieldOptions::default())
        .with_optional("legend", FieldOptions::default());

    let mut configs = BTreeMap::new();
    configs.insert("table".to_string(), config);
    configs
}
