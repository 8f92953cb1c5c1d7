use super::schema::{FieldOptions, WidgetConfig};
use crate::model::DataTableRecord;
use ahash::AHashMap;
use serde_json::{Map, Value, json};

/// Count used for `groupBy` when neither the option nor the schema provides one.
const DEFAULT_GROUP_BY_COUNT: u64 = 5;
const DEFAULT_FORMAT_RULES_BASE_COLOR: &str = "#E5E5E8";
const DEFAULT_COLOR_SCHEMA: &str = "Coral";

/// Everything a field needs to judge or rebuild its value.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub config: &'a WidgetConfig,
    pub options: &'a FieldOptions,
    pub data_table: Option<&'a DataTableRecord>,
}

impl<'a> FieldContext<'a> {
    /// Keys of the field's data target on the current data table.
    pub fn available_keys(&self) -> Vec<&'a str> {
        self.data_table
            .map(|table| table.available_field_keys(self.options.target()))
            .unwrap_or_default()
    }

    /// Label keys followed by data keys.
    pub fn all_keys(&self) -> Vec<&'a str> {
        self.data_table
            .map(DataTableRecord::all_field_keys)
            .unwrap_or_default()
    }

    pub fn pivot_column(&self) -> Option<&'a str> {
        self.data_table.and_then(DataTableRecord::pivot_column_field)
    }
}

/// The contract for one widget option field.
pub trait WidgetField: Send + Sync {
    fn field_name(&self) -> &str;

    /// Whether the value refers to field keys of the selected data table.
    fn affected_by_data_table(&self, _options: &FieldOptions) -> bool {
        false
    }

    fn validate(&self, _value: &Value, _ctx: &FieldContext<'_>) -> bool {
        true
    }

    /// Rewrites an invalid value so it only refers to keys the data table still has.
    fn reconcile(&self, value: &Value, _ctx: &FieldContext<'_>) -> Value {
        value.clone()
    }

    fn default_value(&self, _ctx: &FieldContext<'_>) -> Option<Value> {
        None
    }
}

pub type FieldRegistry = AHashMap<String, Box<dyn WidgetField>>;

fn first_key(keys: &[&str]) -> Value {
    keys.first().map_or(Value::Null, |k| Value::from(*k))
}

fn is_available(value: Option<&Value>, keys: &[&str]) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|v| keys.contains(&v))
}

fn all_available(value: Option<&Value>, keys: &[&str]) -> bool {
    value
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().all(|item| is_available(Some(item), keys)))
}

fn keep_available(value: Option<&Value>, keys: &[&str]) -> Value {
    let kept = value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| is_available(Some(item), keys))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Value::Array(kept)
}

fn single_or_first(value: Option<&Value>, keys: &[&str]) -> Value {
    match value {
        Some(v) if is_available(Some(v), keys) => v.clone(),
        _ => first_key(keys),
    }
}

fn with_entry(value: &Value, key: &str, entry: Value) -> Value {
    let mut object = value.as_object().cloned().unwrap_or_default();
    object.insert(key.to_string(), entry);
    Value::Object(object)
}

fn count_within(value: &Value, max: Option<u64>) -> bool {
    value
        .get("count")
        .and_then(Value::as_u64)
        .is_some_and(|count| count > 0 && max.is_none_or(|max| count <= max))
}

fn pivot_selection(column: &str, multi: bool) -> Value {
    if multi { json!([column]) } else { json!(column) }
}

/// `dataField`: the measured column(s).
struct DataField;

impl WidgetField for DataField {
    fn field_name(&self) -> &str {
        "dataField"
    }

    fn affected_by_data_table(&self, _options: &FieldOptions) -> bool {
        true
    }

    fn validate(&self, value: &Value, ctx: &FieldContext<'_>) -> bool {
        let multi = ctx.options.multi_selectable;
        let data = value.get("data");
        if let Some(column) = ctx.pivot_column() {
            return data == Some(&pivot_selection(column, multi));
        }
        let keys = ctx.available_keys();
        if multi {
            data.and_then(Value::as_array).is_some_and(|d| !d.is_empty())
                && all_available(data, &keys)
        } else {
            is_available(data, &keys)
        }
    }

    fn reconcile(&self, value: &Value, ctx: &FieldContext<'_>) -> Value {
        let multi = ctx.options.multi_selectable;
        let data = match ctx.pivot_column() {
            Some(column) => pivot_selection(column, multi),
            None => {
                let keys = ctx.available_keys();
                if multi {
                    keep_available(value.get("data"), &keys)
                } else {
                    single_or_first(value.get("data"), &keys)
                }
            }
        };
        with_entry(value, "data", data)
    }

    fn default_value(&self, ctx: &FieldContext<'_>) -> Option<Value> {
        let keys = ctx.available_keys();
        let data = match (ctx.options.multi_selectable, ctx.options.all_selected) {
            (true, true) => json!(keys),
            (true, false) => Value::Array(keys.first().map(|k| json!(k)).into_iter().collect()),
            (false, _) => first_key(&keys),
        };
        Some(json!({ "data": data }))
    }
}

/// `groupBy`: the label column(s) rows are grouped by, with an optional count.
struct GroupByField;

impl WidgetField for GroupByField {
    fn field_name(&self) -> &str {
        "groupBy"
    }

    fn affected_by_data_table(&self, _options: &FieldOptions) -> bool {
        true
    }

    fn validate(&self, value: &Value, ctx: &FieldContext<'_>) -> bool {
        let options = ctx.options;
        let data = value.get("data");
        let count = value.get("count").and_then(Value::as_u64);

        if options.fixed_value.as_ref().is_some_and(|fixed| data != Some(fixed)) {
            return false;
        }
        if options.hide_count && count.is_some_and(|c| c > 0) {
            return false;
        }
        if !options.hide_count
            && options.default_max_count.is_some()
            && options.max.is_some()
            && !count_within(value, options.max)
        {
            return false;
        }
        if options.exclude_date_field && data.and_then(Value::as_str) == Some("Date") {
            return false;
        }
        if let Some(column) = ctx.pivot_column() {
            return data == Some(&pivot_selection(column, options.multi_selectable));
        }

        let keys = ctx.available_keys();
        if options.multi_selectable {
            all_available(data, &keys)
        } else {
            is_available(data, &keys)
        }
    }

    fn reconcile(&self, value: &Value, ctx: &FieldContext<'_>) -> Value {
        let options = ctx.options;
        let mut result = Map::new();
        if !options.hide_count {
            let count = value
                .get("count")
                .and_then(Value::as_u64)
                .filter(|c| *c > 0)
                .or(options.default_max_count)
                .unwrap_or(DEFAULT_GROUP_BY_COUNT);
            result.insert("count".to_string(), json!(count));
        }
        let data = match ctx.pivot_column() {
            Some(column) => pivot_selection(column, options.multi_selectable),
            None => {
                let keys = ctx.available_keys();
                if options.multi_selectable {
                    keep_available(value.get("data"), &keys)
                } else {
                    single_or_first(value.get("data"), &keys)
                }
            }
        };
        result.insert("data".to_string(), data);
        Value::Object(result)
    }

    fn default_value(&self, ctx: &FieldContext<'_>) -> Option<Value> {
        let options = ctx.options;
        let keys = ctx.available_keys();
        let data = match &options.fixed_value {
            Some(fixed) => fixed.clone(),
            None if options.multi_selectable => {
                Value::Array(keys.first().map(|k| json!(k)).into_iter().collect())
            }
            None => first_key(&keys),
        };
        let mut result = Map::new();
        result.insert("data".to_string(), data);
        if !options.hide_count {
            let count = options.default_max_count.unwrap_or(DEFAULT_GROUP_BY_COUNT);
            result.insert("count".to_string(), json!(count));
        }
        Some(Value::Object(result))
    }
}

/// `categoryBy`, `stackBy`, `xAxis` and `yAxis`: a single key plus a count.
struct CategoryField {
    name: &'static str,
}

impl WidgetField for CategoryField {
    fn field_name(&self) -> &str {
        self.name
    }

    fn affected_by_data_table(&self, _options: &FieldOptions) -> bool {
        true
    }

    fn validate(&self, value: &Value, ctx: &FieldContext<'_>) -> bool {
        is_available(value.get("data"), &ctx.available_keys())
            && count_within(value, ctx.options.max)
    }

    fn reconcile(&self, value: &Value, ctx: &FieldContext<'_>) -> Value {
        let keys = ctx.available_keys();
        let mut result = if is_available(value.get("data"), &keys) {
            value.clone()
        } else {
            with_entry(value, "data", first_key(&keys))
        };
        let max = ctx.options.max;
        if !count_within(value, max) {
            let count = ctx
                .options
                .default_max_count
                .unwrap_or(DEFAULT_GROUP_BY_COUNT)
                .min(max.unwrap_or(u64::MAX));
            result = with_entry(&result, "count", json!(count));
        }
        result
    }

    fn default_value(&self, ctx: &FieldContext<'_>) -> Option<Value> {
        Some(json!({
            "data": first_key(&ctx.available_keys()),
            "count": ctx.options.default_max_count,
        }))
    }
}

/// `sankeyDimensions`: exactly two keys linked by the diagram.
struct SankeyDimensionsField;

impl WidgetField for SankeyDimensionsField {
    fn field_name(&self) -> &str {
        "sankeyDimensions"
    }

    fn affected_by_data_table(&self, _options: &FieldOptions) -> bool {
        true
    }

    fn validate(&self, value: &Value, ctx: &FieldContext<'_>) -> bool {
        let data = value.get("data");
        data.and_then(Value::as_array).is_some_and(|d| d.len() == 2)
            && all_available(data, &ctx.available_keys())
            && count_within(value, ctx.options.max)
    }

    fn reconcile(&self, value: &Value, ctx: &FieldContext<'_>) -> Value {
        with_entry(
            value,
            "data",
            keep_available(value.get("data"), &ctx.available_keys()),
        )
    }

    fn default_value(&self, ctx: &FieldContext<'_>) -> Option<Value> {
        let keys = ctx.available_keys();
        Some(json!({
            "data": keys.iter().take(2).collect::<Vec<_>>(),
            "count": ctx.options.default_max_count,
        }))
    }
}

/// `formatRules`: colour rules, optionally bound to one field.
struct FormatRulesField;

impl WidgetField for FormatRulesField {
    fn field_name(&self) -> &str {
        "formatRules"
    }

    fn affected_by_data_table(&self, options: &FieldOptions) -> bool {
        options.use_field
    }

    fn validate(&self, value: &Value, ctx: &FieldContext<'_>) -> bool {
        !ctx.options.use_field || is_available(value.get("field"), &ctx.available_keys())
    }

    fn reconcile(&self, value: &Value, ctx: &FieldContext<'_>) -> Value {
        let keys = ctx.available_keys();
        if is_available(value.get("field"), &keys) {
            value.clone()
        } else {
            with_entry(value, "field", first_key(&keys))
        }
    }

    fn default_value(&self, ctx: &FieldContext<'_>) -> Option<Value> {
        let options = ctx.options;
        let mut result = Map::new();
        result.insert(
            "baseColor".to_string(),
            json!(
                options
                    .base_color
                    .as_deref()
                    .unwrap_or(DEFAULT_FORMAT_RULES_BASE_COLOR)
            ),
        );
        result.insert(
            "rules".to_string(),
            options.default.clone().unwrap_or_else(|| json!([])),
        );
        if options.use_field && options.data_target.is_some() {
            result.insert("field".to_string(), first_key(&ctx.available_keys()));
        }
        Some(Value::Object(result))
    }
}

/// `customTableColumnWidth`: explicit widths keyed by label or data field.
struct CustomTableColumnWidthField;

impl WidgetField for CustomTableColumnWidthField {
    fn field_name(&self) -> &str {
        "customTableColumnWidth"
    }

    fn affected_by_data_table(&self, _options: &FieldOptions) -> bool {
        true
    }

    fn validate(&self, value: &Value, ctx: &FieldContext<'_>) -> bool {
        let keys = ctx.all_keys();
        value
            .get("widthInfos")
            .and_then(Value::as_array)
            .is_none_or(|infos| {
                infos.iter().all(|info| {
                    is_available(info.get("fieldKey"), &keys)
                        && info.get("width").and_then(Value::as_f64).is_some_and(|w| w >= 0.0)
                })
            })
    }

    fn reconcile(&self, value: &Value, ctx: &FieldContext<'_>) -> Value {
        let keys = ctx.all_keys();
        let width_infos: Vec<Value> = value
            .get("widthInfos")
            .and_then(Value::as_array)
            .map(|infos| {
                infos
                    .iter()
                    .filter(|info| is_available(info.get("fieldKey"), &keys))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        json!({ "widthInfos": width_infos })
    }

    fn default_value(&self, _ctx: &FieldContext<'_>) -> Option<Value> {
        Some(json!({ "widthInfos": [] }))
    }
}

/// `tableColumnComparison`: period-over-period comparison on chosen data fields.
struct TableColumnComparisonField;

impl WidgetField for TableColumnComparisonField {
    fn field_name(&self) -> &str {
        "tableColumnComparison"
    }

    fn affected_by_data_table(&self, _options: &FieldOptions) -> bool {
        true
    }

    fn validate(&self, value: &Value, ctx: &FieldContext<'_>) -> bool {
        let fields = value.get("fields");
        fields.is_none() || all_available(fields, &ctx.available_keys())
    }

    fn reconcile(&self, value: &Value, ctx: &FieldContext<'_>) -> Value {
        with_entry(
            value,
            "fields",
            keep_available(value.get("fields"), &ctx.available_keys()),
        )
    }

    fn default_value(&self, _ctx: &FieldContext<'_>) -> Option<Value> {
        Some(json!({ "toggleValue": false, "fields": [] }))
    }
}

/// `colorSchema`: the palette a chart draws series with.
///
/// Only `colorName` is produced; the renderer resolves `colorValue` from the name.
struct ColorSchemaField;

impl WidgetField for ColorSchemaField {
    fn field_name(&self) -> &str {
        "colorSchema"
    }

    fn default_value(&self, ctx: &FieldContext<'_>) -> Option<Value> {
        let name = ctx
            .options
            .default
            .clone()
            .filter(|d| !d.is_null())
            .unwrap_or_else(|| json!(DEFAULT_COLOR_SCHEMA));
        Some(json!({ "colorName": name }))
    }
}

/// Defines fields that never depend on the data table and default to a fixed value.
///
/// With a wrap key, a `default` in the widget's field options replaces the built-in
/// value as `{ key: default }`. Without one the schema default is ignored.
macro_rules! define_cosmetic_fields {
    ( $( ($struct_name:ident, $field_name:expr, $wrap_key:expr, $default:tt) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl WidgetField for $struct_name {
                fn field_name(&self) -> &str { $field_name }
                fn default_value(&self, ctx: &FieldContext<'_>) -> Option<Value> {
                    let wrap_key: Option<&str> = $wrap_key;
                    let value = match (wrap_key, &ctx.options.default) {
                        (Some(key), Some(default)) if !default.is_null() => {
                            with_entry(&Value::Null, key, default.clone())
                        }
                        _ => json!($default),
                    };
                    Some(value)
                }
            }
        )*

        fn register_cosmetic_fields(registry: &mut FieldRegistry) {
            $( registry.insert($field_name.to_string(), Box::new($struct_name)); )*
        }
    };
}

define_cosmetic_fields! {
    (ComparisonField, "comparison", None, { "toggleValue": false }),
    (DateRangeField, "dateRange", None, { "inherit": true, "options": { "value": "auto" } }),
    (DisplayAnnotationField, "displayAnnotation", None, { "toggleValue": false }),
    (DisplaySeriesLabelField, "displaySeriesLabel", None, { "toggleValue": false }),
    (GranularityField, "granularity", None, { "granularity": "MONTHLY" }),
    (LegendField, "legend", None, { "toggleValue": true, "position": "right" }),
    (MaxField, "max", Some("max"), { "max": 0 }),
    (MinField, "min", Some("min"), { "min": 0 }),
    (MissingValueField, "missingValue", Some("type"), { "type": "lineToZero" }),
    (NumberFormatField, "numberFormat", None, {}),
    (PieChartTypeField, "pieChartType", Some("type"), { "type": "pie" }),
    (SubTotalField, "subTotal", None, { "toggleValue": false }),
    (TotalField, "total", None, { "toggleValue": false }),
    (TableColumnWidthField, "tableColumnWidth", None, { "widthType": "auto" }),
    (TextWrapField, "textWrap", None, { "toggleValue": false }),
    (TooltipNumberFormatField, "tooltipNumberFormat", None, { "toggleValue": false }),
    (WidgetHeightField, "widgetHeight", Some("type"), { "type": "default" }),
}

/// Registers every built-in field.
pub(super) fn register_default_fields(registry: &mut FieldRegistry) {
    let fields: Vec<Box<dyn WidgetField>> = vec![
        Box::new(DataField),
        Box::new(GroupByField),
        Box::new(CategoryField { name: "categoryBy" }),
        Box::new(CategoryField { name: "stackBy" }),
        Box::new(CategoryField { name: "xAxis" }),
        Box::new(CategoryField { name: "yAxis" }),
        Box::new(SankeyDimensionsField),
        Box::new(FormatRulesField),
        Box::new(CustomTableColumnWidthField),
        Box::new(TableColumnComparisonField),
        Box::new(ColorSchemaField),
    ];
    for field in fields {
        registry.insert(field.field_name().to_string(), field);
    }
    register_cosmetic_fields(registry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_available_drops_unknown_keys() {
        let kept = keep_available(Some(&json!(["cost", "gone", "usage"])), &["cost", "usage"]);
        assert_eq!(kept, json!(["cost", "usage"]));
    }

    #[test]
    fn single_selection_falls_back_to_first_key() {
        assert_eq!(single_or_first(Some(&json!("gone")), &["a", "b"]), json!("a"));
        assert_eq!(single_or_first(Some(&json!("b")), &["a", "b"]), json!("b"));
        assert_eq!(single_or_first(None, &[]), Value::Null);
    }
}
