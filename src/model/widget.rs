use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single widget option, stored by the backend as `{ "value": ... }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub value: Value,
}

impl FieldValue {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// A value counts as unset when it is missing or `null`.
    pub fn is_unset(&self) -> bool {
        self.value.is_null()
    }
}

/// Widget options keyed by field name.
pub type WidgetOptions = BTreeMap<String, FieldValue>;

/// A widget as persisted for a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetRecord {
    pub widget_id: String,
    pub widget_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default)]
    pub options: WidgetOptions,
    /// The data table currently feeding the widget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_table_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WidgetRecord {
    pub fn new(widget_id: impl Into<String>, widget_type: impl Into<String>) -> Self {
        Self {
            widget_id: widget_id.into(),
            widget_type: widget_type.into(),
            size: None,
            options: WidgetOptions::new(),
            data_table_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_data_table(mut self, data_table_id: impl Into<String>) -> Self {
        self.data_table_id = Some(data_table_id.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), FieldValue::new(value));
        self
    }
}

/// One layout (tab/section) of a dashboard and the widgets it places, in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub widgets: Vec<String>,
}

impl DashboardLayout {
    pub fn new<I, S>(widgets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            widgets: widgets.into_iter().map(Into::into).collect(),
        }
    }
}
