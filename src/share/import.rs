use super::{COST_SOURCE_TYPE, is_cost_table};
use crate::error::ImportError;
use crate::model::{Arity, DataTableRecord, SharedDataTableInfo, SharedWidgetInfo};
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// Looks up the shared data table at `index`. `-1` and out-of-range indices yield `None`.
pub fn resolve_shared_reference(
    tables: &[SharedDataTableInfo],
    index: i64,
) -> Option<&SharedDataTableInfo> {
    usize::try_from(index).ok().and_then(|i| tables.get(i))
}

impl SharedWidgetInfo {
    pub fn selected_data_table(&self) -> Option<&SharedDataTableInfo> {
        self.data_tables.get(self.data_table_id)
    }

    /// The shared records a data table of this widget reads from, in operator order.
    pub fn parents_of(&self, index: usize) -> Vec<Option<&SharedDataTableInfo>> {
        self.data_tables
            .get(index)
            .map(|table| {
                table
                    .parent_indices()
                    .into_iter()
                    .map(|parent| parent.and_then(|i| self.data_tables.get(i)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Order in which a template's tables must be created so that every parent exists
/// before the tables that reference it.
///
/// Unresolved references are ignored. Ties keep array order.
pub fn creation_order(tables: &[SharedDataTableInfo]) -> Result<Vec<usize>, ImportError> {
    let mut in_degree = vec![0usize; tables.len()];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); tables.len()];
    for (index, table) in tables.iter().enumerate() {
        for parent in table.parent_indices().into_iter().flatten() {
            if parent < tables.len() {
                children[parent].push(index);
                in_degree[index] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..tables.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(tables.len());
    while let Some(index) = queue.pop_front() {
        order.push(index);
        for &child in &children[index] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    if order.len() < tables.len() {
        let indices = (0..tables.len()).filter(|&i| in_degree[i] > 0).collect();
        return Err(ImportError::CycleDetected { indices });
    }
    Ok(order)
}

/// Turns a template's shared data tables back into id-addressed records.
///
/// `assign_id` is called once per table, in [`creation_order`], and returns the id
/// the table gets. The records come back in array order with every resolvable index
/// rewritten to the assigned id; unresolved references become `null`.
pub fn instantiate_data_tables<F>(
    tables: &[SharedDataTableInfo],
    mut assign_id: F,
) -> Result<Vec<DataTableRecord>, ImportError>
where
    F: FnMut(usize, &SharedDataTableInfo) -> String,
{
    let order = creation_order(tables)?;
    let mut ids = vec![String::new(); tables.len()];
    for index in order {
        ids[index] = assign_id(index, &tables[index]);
    }

    let id_of = |value: &Value| -> Value {
        value
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| ids.get(i))
            .map_or(Value::Null, |id| Value::String(id.clone()))
    };

    Ok(tables
        .iter()
        .zip(&ids)
        .map(|(table, id)| {
            let mut options = table.options.clone();
            if let Some(operator) = table.operator_kind() {
                let reference = options
                    .get_mut(operator.as_str())
                    .and_then(Value::as_object_mut)
                    .and_then(|o| o.get_mut(operator.reference_key()));
                match (operator.arity(), reference) {
                    (Arity::Binary, Some(Value::Array(indices))) => {
                        for index in indices.iter_mut() {
                            *index = id_of(index);
                        }
                    }
                    (Arity::Unary, Some(index)) => *index = id_of(index),
                    _ => {}
                }
            }
            DataTableRecord {
                id: id.clone(),
                name: table.name.clone(),
                data_type: table.data_type,
                source_type: table.source_type.clone(),
                operator: table.operator.clone(),
                options,
                labels_info: Map::new(),
                data_info: Map::new(),
                extra: Map::new(),
            }
        })
        .collect())
}

/// Reverses the export-time cost rewrite: maps each `plugin_id` to a data source of
/// the importing domain.
pub fn restore_cost_data_source<F>(records: &mut [DataTableRecord], resolve: F)
where
    F: Fn(&str) -> Option<String>,
{
    for record in records.iter_mut().filter(|r| is_cost_table(r)) {
        let Some(Value::Object(cost)) = record.options.get_mut(COST_SOURCE_TYPE) else {
            continue;
        };
        let Some(plugin_id) = cost
            .get("plugin_id")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            continue;
        };
        match resolve(&plugin_id) {
            Some(data_source_id) => {
                cost.insert("data_source_id".to_string(), Value::String(data_source_id));
                cost.remove("plugin_id");
            }
            None => {
                tracing::warn!(%plugin_id, "no local data source for shared cost plugin");
            }
        }
    }
}
