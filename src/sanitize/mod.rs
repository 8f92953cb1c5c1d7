//! Reconciles a widget's options with the data table it currently reads from.

use crate::model::{DataTableRecord, FieldValue, WidgetOptions};

mod fields;
mod schema;

pub use fields::{FieldContext, FieldRegistry, WidgetField};
pub use schema::{FieldOptions, FieldSchema, WidgetConfig, WidgetConfigSource};

use fields::register_default_fields;

/// Option keys every widget accepts whether or not its schema declares them.
pub const ALWAYS_ALLOWED_OPTION_KEYS: [&str; 1] = ["widgetHeader"];

/// Produces a valid options map for a widget and its selected data table.
///
/// Sanitizing is a pure transformation: the input map is never modified.
pub struct OptionsSanitizer<'a> {
    configs: &'a dyn WidgetConfigSource,
    fields: FieldRegistry,
}

pub struct OptionsSanitizerBuilder<'a> {
    configs: &'a dyn WidgetConfigSource,
    fields: FieldRegistry,
}

impl<'a> OptionsSanitizerBuilder<'a> {
    /// Adds a field, replacing any built-in field with the same name.
    pub fn with_custom_field(mut self, field: Box<dyn WidgetField>) -> Self {
        self.fields.insert(field.field_name().to_string(), field);
        self
    }

    pub fn build(self) -> OptionsSanitizer<'a> {
        OptionsSanitizer {
            configs: self.configs,
            fields: self.fields,
        }
    }
}

impl<'a> OptionsSanitizer<'a> {
    pub fn builder(configs: &'a dyn WidgetConfigSource) -> OptionsSanitizerBuilder<'a> {
        let mut fields = FieldRegistry::new();
        register_default_fields(&mut fields);
        OptionsSanitizerBuilder { configs, fields }
    }

    pub fn new(configs: &'a dyn WidgetConfigSource) -> Self {
        Self::builder(configs).build()
    }

    /// Sanitizes `options` of a `widget_type` widget against `data_table`.
    ///
    /// 1. Keys the widget does not declare are dropped.
    /// 2. Declared values that refer to the data table and fail validation are rewritten
    ///    to keys the table still has.
    /// 3. Declared keys without a value receive their field default.
    ///
    /// An unknown widget type leaves the options untouched.
    pub fn sanitize(
        &self,
        options: &WidgetOptions,
        widget_type: &str,
        data_table: Option<&DataTableRecord>,
    ) -> WidgetOptions {
        let Some(config) = self.configs.widget_config(widget_type) else {
            tracing::debug!(%widget_type, "no widget config, options left as-is");
            return options.clone();
        };
        let schema = config.fields_schema();

        let mut sanitized = WidgetOptions::new();
        for (key, current) in options {
            let Some(field_schema) = schema.get(key.as_str()) else {
                if ALWAYS_ALLOWED_OPTION_KEYS.contains(&key.as_str()) {
                    sanitized.insert(key.clone(), current.clone());
                } else {
                    tracing::debug!(%widget_type, option = %key, "dropping undeclared widget option");
                }
                continue;
            };

            let reconciled = match (data_table, self.fields.get(key)) {
                (Some(table), Some(field))
                    if !current.is_unset()
                        && field.affected_by_data_table(&field_schema.options) =>
                {
                    let ctx = FieldContext {
                        config,
                        options: &field_schema.options,
                        data_table: Some(table),
                    };
                    if field.validate(&current.value, &ctx) {
                        current.clone()
                    } else {
                        tracing::debug!(option = %key, data_table_id = %table.id, "reconciling widget option with data table");
                        FieldValue::new(field.reconcile(&current.value, &ctx))
                    }
                }
                _ => current.clone(),
            };
            sanitized.insert(key.clone(), reconciled);
        }

        for (key, field_schema) in &schema {
            if sanitized.get(*key).is_some_and(|v| !v.is_unset()) {
                continue;
            }
            let Some(field) = self.fields.get(*key) else {
                continue;
            };
            let ctx = FieldContext {
                config,
                options: &field_schema.options,
                data_table,
            };
            if let Some(default) = field.default_value(&ctx) {
                sanitized.insert(key.to_string(), FieldValue::new(default));
            }
        }

        sanitized
    }
}
