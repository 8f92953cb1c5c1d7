use clap::Parser;
use rand::Rng;
use rand::rngs::ThreadRng;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use tablegraph::fixture::DashboardFixture;
use tablegraph::model::{DashboardLayout, DataTableRecord, Operator, WidgetRecord};
use tablegraph::sanitize::{FieldOptions, WidgetConfig};
use tablegraph::share::COST_SOURCE_TYPE;

const LABEL_KEYS: [&str; 5] = ["provider", "region", "service", "account", "project"];
const DATA_KEYS: [&str; 4] = ["cost", "usage", "credit", "tax"];
const WIDGET_TYPES: [&str; 3] = ["table", "bar", "line"];

/// A CLI tool to generate random dashboard fixtures for tablegraph
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_dashboard.json")]
    output: String,

    /// Number of widgets to generate
    #[arg(short, long, default_value_t = 4)]
    widgets: usize,

    /// The minimum number of data tables per widget
    #[arg(long, default_value_t = 1)]
    min: usize,

    /// The maximum number of data tables per widget
    #[arg(long, default_value_t = 8)]
    max: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.min == 0 || cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) must be at least 1 and not greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }

    println!(
        "Generating {} widget(s) with {} to {} data tables each...",
        cli.widgets, cli.min, cli.max
    );

    let mut fixture = DashboardFixture::default();
    for w in 0..cli.widgets {
        let widget_id = format!("w-{}", w + 1);
        let count = rng.random_range(cli.min..=cli.max);
        let tables = generate_data_tables(&mut rng, &widget_id, count);

        let widget_type = WIDGET_TYPES[rng.random_range(0..WIDGET_TYPES.len())];
        let selected = &tables[rng.random_range(0..tables.len())];
        let widget = WidgetRecord::new(&widget_id, widget_type)
            .with_size("md")
            .with_data_table(selected.id.clone())
            .with_option("widgetHeader", json!(format!("Widget {}", w + 1)))
            .with_option(
                "groupBy",
                json!({ "data": LABEL_KEYS[rng.random_range(0..LABEL_KEYS.len())], "count": 5 }),
            );
        println!("-> '{}' ({}) with {} data table(s).", widget_id, widget_type, count);

        fixture.data_tables.insert(widget_id, tables);
        fixture.widgets.push(widget);
    }

    let widget_ids: Vec<_> = fixture.widgets.iter().map(|w| w.widget_id.clone()).collect();
    let (first, second) = widget_ids.split_at(widget_ids.len().div_ceil(2));
    fixture.layouts = vec![
        DashboardLayout::new(first.iter().cloned()),
        DashboardLayout::new(second.iter().cloned()),
    ];
    fixture.cost_data_sources = generate_cost_data_sources();
    fixture.widget_configs = generate_widget_configs();

    let json_output = serde_json::to_string_pretty(&fixture)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved dashboard fixture to '{}'",
        cli.output
    );

    Ok(())
}

/// Generates an acyclic list of data tables; transformed tables only read from earlier ones.
fn generate_data_tables(rng: &mut ThreadRng, widget_id: &str, count: usize) -> Vec<DataTableRecord> {
    let mut tables: Vec<DataTableRecord> = Vec::with_capacity(count);

    for i in 0..count {
        let id = format!("{}-dt-{}", widget_id, i + 1);
        let record = if i == 0 || rng.random_bool(0.3) {
            generate_raw_table(rng, &id)
        } else {
            let operator = Operator::ALL[rng.random_range(0..Operator::ALL.len())];
            let parent = |rng: &mut ThreadRng| tables[rng.random_range(0..tables.len())].id.clone();
            let options = match operator {
                Operator::Join | Operator::Concat => {
                    json!({ "data_tables": [parent(rng), parent(rng)] })
                }
                Operator::Pivot => json!({
                    "data_table_id": parent(rng),
                    "fields": { "row": "service", "column": "month", "value": "cost" },
                }),
                _ => json!({ "data_table_id": parent(rng) }),
            };
            DataTableRecord::transformed(&id, operator, options)
                .with_label_keys(pick(rng, &LABEL_KEYS))
                .with_data_keys(pick(rng, &DATA_KEYS))
        };
        tables.push(record.with_name(format!("Table {}", i + 1)));
    }

    tables
}

fn generate_raw_table(rng: &mut ThreadRng, id: &str) -> DataTableRecord {
    let mut record = DataTableRecord::raw(id)
        .with_label_keys(pick(rng, &LABEL_KEYS))
        .with_data_keys(pick(rng, &DATA_KEYS));
    if rng.random_bool(0.5) {
        let data_source = format!("ds-{}", rng.random_range(1..=3));
        record = record.with_source_type(COST_SOURCE_TYPE);
        record.options.insert(
            COST_SOURCE_TYPE.to_string(),
            json!({ "data_source_id": data_source, "granularity": "MONTHLY" }),
        );
    }
    record
}

/// A non-empty random subset of `keys`, in declaration order.
fn pick<'k>(rng: &mut ThreadRng, keys: &[&'k str]) -> Vec<&'k str> {
    let picked: Vec<_> = keys.iter().copied().filter(|_| rng.random_bool(0.6)).collect();
    if picked.is_empty() {
        vec![keys[0]]
    } else {
        picked
    }
}

fn generate_cost_data_sources() -> BTreeMap<String, String> {
    (1..=3)
        .map(|i| (format!("ds-{}", i), format!("plugin-{}", i)))
        .collect()
}

fn generate_widget_configs() -> BTreeMap<String, WidgetConfig> {
    WIDGET_TYPES
        .iter()
        .map(|widget_type| {
            let config = WidgetConfig::new(*widget_type)
                .with_required(
                    "groupBy",
                    FieldOptions {
                        data_target: Some(tablegraph::model::DataTarget::LabelsInfo),
                        default_max_count: Some(10),
                        ..FieldOptions::default()
                    },
                )
                .with_required(
                    "dataField",
                    FieldOptions {
                        multi_selectable: *widget_type == "table",
                        ..FieldOptions::default()
                    },
                )
                .with_optional("legend", FieldOptions::default());
            (widget_type.to_string(), config)
        })
        .collect()
}
