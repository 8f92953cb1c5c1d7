use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Prefix carried by data tables that only exist in the local editing session.
pub const UNSAVED_DATA_TABLE_PREFIX: &str = "UNSAVED-";

/// Options key holding the parent pair of a binary operator.
pub const BINARY_REFERENCE_KEY: &str = "data_tables";
/// Options key holding the parent of a unary operator.
pub const UNARY_REFERENCE_KEY: &str = "data_table_id";

/// Whether a data table is fetched from a source or derived from other tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "ADDED", alias = "RAW")]
    Raw,
    #[serde(rename = "TRANSFORMED")]
    Transformed,
}

/// The fixed set of transform operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Concat,
    Join,
    Query,
    Eval,
    Pivot,
    AddLabels,
    ValueMapping,
}

/// Number of parent tables an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Concat,
        Operator::Join,
        Operator::Query,
        Operator::Eval,
        Operator::Pivot,
        Operator::AddLabels,
        Operator::ValueMapping,
    ];

    /// Looks up an operator by its wire name, e.g. `"JOIN"`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Concat => "CONCAT",
            Operator::Join => "JOIN",
            Operator::Query => "QUERY",
            Operator::Eval => "EVAL",
            Operator::Pivot => "PIVOT",
            Operator::AddLabels => "ADD_LABELS",
            Operator::ValueMapping => "VALUE_MAPPING",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::Concat | Operator::Join => Arity::Binary,
            _ => Arity::Unary,
        }
    }

    /// The key inside the operator's options that holds its parent reference(s).
    pub fn reference_key(&self) -> &'static str {
        match self.arity() {
            Arity::Binary => BINARY_REFERENCE_KEY,
            Arity::Unary => UNARY_REFERENCE_KEY,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of a data table's output shape a widget field reads keys from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataTarget {
    #[default]
    #[serde(rename = "data_info")]
    DataInfo,
    #[serde(rename = "labels_info")]
    LabelsInfo,
}

/// One data table attached to a widget, as returned by the backend.
///
/// `operator` is kept as the raw wire string so that records written by a newer
/// backend, or half-edited in the UI, still load. [`DataTableRecord::operator_kind`]
/// resolves it against the known operator set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTableRecord {
    #[serde(rename = "data_table_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub labels_info: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data_info: Map<String, Value>,
    /// Domain payload the graph logic never looks at.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataTableRecord {
    pub fn raw(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            data_type: DataType::Raw,
            source_type: None,
            operator: None,
            options: Map::new(),
            labels_info: Map::new(),
            data_info: Map::new(),
            extra: Map::new(),
        }
    }

    /// A transformed table whose operator options are `operator_options`.
    pub fn transformed(id: impl Into<String>, operator: Operator, operator_options: Value) -> Self {
        let mut options = Map::new();
        options.insert(operator.as_str().to_string(), operator_options);
        Self {
            data_type: DataType::Transformed,
            operator: Some(operator.as_str().to_string()),
            options,
            ..Self::raw(id)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    pub fn with_data_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.data_info.insert(key.into(), Value::Object(Map::new()));
        }
        self
    }

    pub fn with_label_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.labels_info.insert(key.into(), Value::Object(Map::new()));
        }
        self
    }

    pub fn is_unsaved(&self, prefix: &str) -> bool {
        self.id.is_empty() || self.id.starts_with(prefix)
    }

    /// The resolved operator, only for transformed tables with a known operator name.
    pub fn operator_kind(&self) -> Option<Operator> {
        if self.data_type != DataType::Transformed {
            return None;
        }
        self.operator.as_deref().and_then(Operator::from_name)
    }

    /// The options object stored under the table's own operator key.
    pub fn operator_options(&self) -> Option<&Map<String, Value>> {
        let operator = self.operator_kind()?;
        self.options.get(operator.as_str())?.as_object()
    }

    /// Parent ids declared by the operator options, left before right for binary operators.
    ///
    /// Returns an empty list for raw tables and for transformed tables whose
    /// reference is missing or malformed.
    pub fn parent_ids(&self) -> Vec<&str> {
        let (Some(operator), Some(options)) = (self.operator_kind(), self.operator_options())
        else {
            return Vec::new();
        };
        let reference = options.get(operator.reference_key());
        match operator.arity() {
            Arity::Binary => match reference.and_then(Value::as_array).map(Vec::as_slice) {
                Some([Value::String(left), Value::String(right), ..])
                    if !left.is_empty() && !right.is_empty() =>
                {
                    vec![left.as_str(), right.as_str()]
                }
                _ => Vec::new(),
            },
            Arity::Unary => match reference.and_then(Value::as_str) {
                Some(parent) if !parent.is_empty() => vec![parent],
                _ => Vec::new(),
            },
        }
    }

    /// Field keys produced by this table for the given target.
    pub fn available_field_keys(&self, target: DataTarget) -> Vec<&str> {
        let info = match target {
            DataTarget::DataInfo => &self.data_info,
            DataTarget::LabelsInfo => &self.labels_info,
        };
        info.keys().map(String::as_str).collect()
    }

    /// Label keys followed by data keys.
    pub fn all_field_keys(&self) -> Vec<&str> {
        self.labels_info
            .keys()
            .chain(self.data_info.keys())
            .map(String::as_str)
            .collect()
    }

    /// The column field a PIVOT table spreads into data columns.
    pub fn pivot_column_field(&self) -> Option<&str> {
        if self.operator_kind() != Some(Operator::Pivot) {
            return None;
        }
        self.operator_options()?
            .get("fields")?
            .get("column")?
            .as_str()
    }
}

/// The payload re-submitted to the backend when a table must be recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTableUpdate {
    pub name: Option<String>,
    pub options: Map<String, Value>,
}

impl From<&DataTableRecord> for DataTableUpdate {
    fn from(record: &DataTableRecord) -> Self {
        Self {
            name: record.name.clone(),
            options: record.options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_operator_names() {
        assert_eq!(Operator::from_name("JOIN"), Some(Operator::Join));
        assert_eq!(Operator::from_name("ADD_LABELS"), Some(Operator::AddLabels));
        assert_eq!(Operator::from_name("MERGE"), None);
    }

    #[test]
    fn binary_parents_require_both_ids() {
        let record = DataTableRecord::transformed(
            "dt-3",
            Operator::Concat,
            json!({ "data_tables": ["dt-1", null] }),
        );
        assert!(record.parent_ids().is_empty());
    }

    #[test]
    fn raw_alias_deserializes() {
        let record: DataTableRecord =
            serde_json::from_value(json!({ "data_table_id": "dt-1", "data_type": "RAW" }))
                .unwrap();
        assert_eq!(record.data_type, DataType::Raw);
    }
}
