use clap::{Parser, Subcommand};
use futures::executor::block_on;
use std::fs;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Instant;
use tablegraph::fixture::{DashboardFixture, InMemorySource};
use tablegraph::graph::find_cycle;
use tablegraph::prelude::*;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Inspect, cascade, share and sanitize the data tables of a dashboard fixture
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the dashboard fixture JSON file
    fixture_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the dependency graph of a widget's data tables
    Graph {
        #[arg(short, long)]
        widget: String,
    },
    /// Print the order in which a widget's data tables must be computed
    Order {
        #[arg(short, long)]
        widget: String,
    },
    /// Cascade a data table change through its dependents
    Cascade {
        #[arg(short, long)]
        widget: String,
        /// Id of the data table that changed
        #[arg(short, long)]
        changed: String,
        /// Keep cascading into sibling subtrees when an update fails
        #[arg(long)]
        isolate: bool,
        /// Data table ids whose update should be rejected
        #[arg(long = "fail")]
        failing: Vec<String>,
    },
    /// Export the dashboard as index-addressed shared layouts
    Share {
        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
        /// Widget ids whose data table fetch should fail
        #[arg(long = "fail")]
        failing: Vec<String>,
    },
    /// Print a widget's options after reconciling them with its selected data table
    Sanitize {
        #[arg(short, long)]
        widget: String,
        /// Sanitize against this data table instead of the widget's selection
        #[arg(short, long)]
        data_table: Option<String>,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let load_start = Instant::now();
    let fixture = DashboardFixture::from_file(&cli.fixture_path)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    tracing::info!(
        path = %cli.fixture_path,
        widgets = fixture.widgets.len(),
        elapsed = ?load_start.elapsed(),
        "loaded dashboard fixture"
    );

    match cli.command {
        Command::Graph { widget } => print_graph(&fixture, &widget),
        Command::Order { widget } => print_order(&fixture, &widget),
        Command::Cascade {
            widget,
            changed,
            isolate,
            failing,
        } => run_cascade(&fixture, &widget, &changed, isolate, &failing),
        Command::Share { output, failing } => run_share(&fixture, output.as_deref(), &failing),
        Command::Sanitize { widget, data_table } => {
            run_sanitize(&fixture, &widget, data_table.as_deref())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn widget_tables<'a>(fixture: &'a DashboardFixture, widget_id: &str) -> &'a [DataTableRecord] {
    if fixture.widget(widget_id).is_none() && !fixture.data_tables.contains_key(widget_id) {
        exit_with_error(&format!("Widget '{}' is not part of the fixture", widget_id));
    }
    fixture.widget_data_tables(widget_id)
}

fn print_graph(fixture: &DashboardFixture, widget_id: &str) {
    let graph = DependencyGraph::build(widget_tables(fixture, widget_id));

    println!("Data table graph of widget '{}' ({} nodes)", widget_id, graph.len());
    for node in graph.iter() {
        println!("  {}", node.data_table_id);
        if !node.parents.is_empty() {
            println!("    parents:  {}", node.parents.join(", "));
        }
        if !node.children.is_empty() {
            println!("    children: {}", node.children.join(", "));
        }
    }
    if let Some(cycle) = find_cycle(&graph) {
        println!("\nWarning: cycle {}", cycle.join(" -> "));
    }
}

fn print_order(fixture: &DashboardFixture, widget_id: &str) {
    let graph = DependencyGraph::build(widget_tables(fixture, widget_id));
    if let Some(cycle) = find_cycle(&graph) {
        exit_with_error(&format!("Cycle detected: {}", cycle.join(" -> ")));
    }
    for (position, id) in execution_order(&graph).iter().enumerate() {
        println!("{:>3}. {}", position + 1, id);
    }
}

fn run_cascade(
    fixture: &DashboardFixture,
    widget_id: &str,
    changed_id: &str,
    isolate: bool,
    failing: &[String],
) {
    let source = failing.iter().fold(InMemorySource::from_fixture(fixture), |source, id| {
        source.with_failing_update(id)
    });
    let policy = if isolate {
        FailurePolicy::IsolateSiblings
    } else {
        FailurePolicy::Abort
    };
    let updater = CascadeUpdater::builder(&source)
        .with_failure_policy(policy)
        .build();
    let mut cache = DataTableCache::new(widget_tables(fixture, widget_id).to_vec());

    let start = Instant::now();
    let report = block_on(updater.cascade_update(&mut cache, changed_id))
        .unwrap_or_else(|e| exit_with_error(&format!("Cascade failed: {}", e)));
    let duration = start.elapsed();

    println!("Cascade from '{}' finished in {:?}", changed_id, duration);
    println!("  updated: {}", report.updated.join(", "));
    if !report.skipped.is_empty() {
        println!("  skipped: {}", report.skipped.join(", "));
    }
    for failure in &report.failed {
        println!("  failed:  {} ({})", failure.data_table_id, failure.error);
    }
    println!("  calls:   {}", source.update_log().len());
}

fn run_share(fixture: &DashboardFixture, output: Option<&str>, failing: &[String]) {
    let source = failing.iter().fold(InMemorySource::from_fixture(fixture), |source, id| {
        source.with_failing_widget(id)
    });
    let exporter = SharedDashboardExporter::builder(&source)
        .with_cost_lookup(&fixture.cost_data_sources)
        .with_error_reporter(Arc::new(|widget_id: &str, error: &BoxError| {
            eprintln!("Warning: widget '{}' exported without data tables: {}", widget_id, error);
        }))
        .build();

    let shared = block_on(exporter.share_layouts(&fixture.layouts, &fixture.widgets));
    let json = serde_json::to_string_pretty(&shared)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize layouts: {}", e)));

    match output {
        Some(path) => {
            fs::write(path, json)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e)));
            println!("Shared {} layout(s) to '{}'", shared.len(), path);
        }
        None => println!("{}", json),
    }
}

fn run_sanitize(fixture: &DashboardFixture, widget_id: &str, data_table_id: Option<&str>) {
    let widget = fixture
        .widget(widget_id)
        .unwrap_or_else(|| exit_with_error(&format!("Widget '{}' is not part of the fixture", widget_id)));
    let selected_id = data_table_id.or(widget.data_table_id.as_deref());
    let data_table = selected_id.and_then(|id| {
        fixture
            .widget_data_tables(widget_id)
            .iter()
            .find(|record| record.id == id)
    });
    if let (Some(id), None) = (selected_id, data_table) {
        tracing::warn!(data_table_id = %id, "selected data table not found, sanitizing without it");
    }

    let sanitizer = OptionsSanitizer::new(&fixture.widget_configs);
    let sanitized = sanitizer.sanitize(&widget.options, &widget.widget_type, data_table);
    let json = serde_json::to_string_pretty(&sanitized)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize options: {}", e)));
    println!("{}", json);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
