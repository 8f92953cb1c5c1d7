use crate::model::DataTarget;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Per-widget configuration of a single option field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldOptions {
    pub multi_selectable: bool,
    pub all_selected: bool,
    pub data_target: Option<DataTarget>,
    pub hide_count: bool,
    pub default_max_count: Option<u64>,
    pub max: Option<u64>,
    pub fixed_value: Option<Value>,
    pub exclude_date_field: bool,
    pub use_field: bool,
    pub base_color: Option<String>,
    pub default: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldOptions {
    pub fn target(&self) -> DataTarget {
        self.data_target.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    pub options: FieldOptions,
}

/// The option fields a widget type declares.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub widget_name: String,
    #[serde(default)]
    pub required_fields_schema: BTreeMap<String, FieldSchema>,
    #[serde(default)]
    pub optional_fields_schema: BTreeMap<String, FieldSchema>,
}

impl WidgetConfig {
    pub fn new(widget_name: impl Into<String>) -> Self {
        Self {
            widget_name: widget_name.into(),
            ..Self::default()
        }
    }

    pub fn with_required(mut self, field: &str, options: FieldOptions) -> Self {
        self.required_fields_schema
            .insert(field.to_string(), FieldSchema { options });
        self
    }

    pub fn with_optional(mut self, field: &str, options: FieldOptions) -> Self {
        self.optional_fields_schema
            .insert(field.to_string(), FieldSchema { options });
        self
    }

    /// Required and optional fields merged; a required declaration wins over an optional one.
    pub fn fields_schema(&self) -> BTreeMap<&str, &FieldSchema> {
        self.optional_fields_schema
            .iter()
            .chain(&self.required_fields_schema)
            .map(|(name, schema)| (name.as_str(), schema))
            .collect()
    }
}

/// Supplies the configuration of a widget type.
pub trait WidgetConfigSource: Send + Sync {
    fn widget_config(&self, widget_type: &str) -> Option<&WidgetConfig>;
}

impl WidgetConfigSource for AHashMap<String, WidgetConfig> {
    fn widget_config(&self, widget_type: &str) -> Option<&WidgetConfig> {
        self.get(widget_type)
    }
}

impl WidgetConfigSource for HashMap<String, WidgetConfig> {
    fn widget_config(&self, widget_type: &str) -> Option<&WidgetConfig> {
        self.get(widget_type)
    }
}

impl WidgetConfigSource for BTreeMap<String, WidgetConfig> {
    fn widget_config(&self, widget_type: &str) -> Option<&WidgetConfig> {
        self.get(widget_type)
    }
}
