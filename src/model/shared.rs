use super::data_table::{Arity, DataType, Operator};
use super::widget::WidgetOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Index written for a parent reference that could not be resolved.
pub const NOT_FOUND_INDEX: i64 = -1;

/// A data table in its portable form: no id, parent references are positions
/// in the owning widget's `data_tables` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedDataTableInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl SharedDataTableInfo {
    pub fn operator_kind(&self) -> Option<Operator> {
        if self.data_type != DataType::Transformed {
            return None;
        }
        self.operator.as_deref().and_then(Operator::from_name)
    }

    /// Parent positions in declaration order. `None` marks a reference that was
    /// unresolved at export time (`-1`) or is not a valid index.
    pub fn parent_indices(&self) -> Vec<Option<usize>> {
        let Some(operator) = self.operator_kind() else {
            return Vec::new();
        };
        let reference = self
            .options
            .get(operator.as_str())
            .and_then(|options| options.get(operator.reference_key()));
        match (operator.arity(), reference) {
            (Arity::Binary, Some(Value::Array(indices))) => {
                indices.iter().map(as_index).collect()
            }
            (Arity::Unary, Some(index)) => vec![as_index(index)],
            _ => Vec::new(),
        }
    }
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|i| usize::try_from(i).ok())
}

/// A widget in its portable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedWidgetInfo {
    pub widget_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default)]
    pub options: WidgetOptions,
    #[serde(default)]
    pub data_tables: Vec<SharedDataTableInfo>,
    /// Position of the selected data table in `data_tables`; `0` when the
    /// selection could not be resolved.
    #[serde(default)]
    pub data_table_id: usize,
}

/// A dashboard layout in its portable form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SharedDashboardLayout {
    #[serde(default)]
    pub widgets: Vec<SharedWidgetInfo>,
}
