use serde_json::json;
use tablegraph::error::FixtureError;
use tablegraph::fixture::{DashboardFixture, InMemorySource};
use tablegraph::prelude::*;
use tokio_test::block_on;

const DASHBOARD: &str = include_str!("fixtures/dashboard.json");

fn load() -> DashboardFixture {
    DashboardFixture::from_json(DASHBOARD).unwrap()
}

#[test]
fn test_fixture_loads() {
    let fixture = load();

    assert_eq!(fixture.layouts.len(), 2);
    assert_eq!(fixture.widget("w-spend").unwrap().size.as_deref(), Some("lg"));
    assert_eq!(fixture.widget_data_tables("w-spend").len(), 5);
    assert!(fixture.widget_data_tables("w-nothing").is_empty());
    assert_eq!(fixture.widget_data_tables("w-usage")[0].data_type, DataType::Raw);
}

#[test]
fn test_fixture_file_errors() {
    match DashboardFixture::from_file("tests/fixtures/does-not-exist.json") {
        Err(FixtureError::Io { path, .. }) => assert!(path.ends_with("does-not-exist.json")),
        other => panic!("expected Io error, got {other:?}"),
    }
    assert!(matches!(
        DashboardFixture::from_json("{ \"layouts\": 3 }"),
        Err(FixtureError::Json(_))
    ));
}

#[test]
fn test_dashboard_graph() {
    let fixture = load();
    let graph = DependencyGraph::build(fixture.widget_data_tables("w-spend"));

    assert_eq!(graph.len(), 4);
    assert_eq!(execution_order(&graph), vec!["dt-1", "dt-2", "dt-3", "dt-4"]);
    assert_eq!(graph.descendants("dt-1"), vec!["dt-3", "dt-4"]);
}

#[test]
fn test_dashboard_cascade() {
    let fixture = load();
    let source = InMemorySource::from_fixture(&fixture);
    let mut cache = DataTableCache::new(fixture.widget_data_tables("w-spend").to_vec());

    let report = block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "dt-2")).unwrap();

    assert_eq!(report.updated, vec!["dt-3", "dt-4"]);
    assert_eq!(source.update_log(), vec!["dt-3", "dt-4"]);
}

#[test]
fn test_dashboard_share() {
    let fixture = load();
    let source = InMemorySource::from_fixture(&fixture);

    let exporter = SharedDashboardExporter::builder(&source)
        .with_cost_lookup(&fixture.cost_data_sources)
        .build();
    let shared = block_on(exporter.share_layouts(&fixture.layouts, &fixture.widgets));

    assert_eq!(shared.len(), 2);
    let spend = &shared[0].widgets[0];
    assert_eq!(spend.data_tables.len(), 4);
    assert_eq!(spend.data_table_id, 2);
    assert_eq!(
        spend.data_tables[0].options["COST"],
        json!({ "granularity": "MONTHLY", "plugin_id": "plugin-aws-cur" })
    );
    assert_eq!(
        spend.data_tables[2].options["JOIN"],
        json!({ "data_tables": [0, 1], "how": "left" })
    );
    assert_eq!(spend.data_tables[3].options["EVAL"]["data_table_id"], json!(2));
    assert_eq!(shared[1].widgets[0], *spend);

    let usage = &shared[0].widgets[1];
    assert_eq!(usage.data_table_id, 0);
    assert_eq!(usage.data_tables[0].name.as_deref(), Some("Usage"));
}

#[test]
fn test_dashboard_sanitize() {
    let fixture = load();
    let sanitizer = OptionsSanitizer::new(&fixture.widget_configs);
    let widget = fixture.widget("w-spend").unwrap();
    let selected = fixture
        .widget_data_tables("w-spend")
        .iter()
        .find(|r| Some(&r.id) == widget.data_table_id.as_ref());

    let sanitized = sanitizer.sanitize(&widget.options, &widget.widget_type, selected);

    let keys: Vec<_> = sanitized.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["dataField", "groupBy", "legend", "widgetHeader"]);

    let usage = fixture.widget("w-usage").unwrap();
    let usage_table = &fixture.widget_data_tables("w-usage")[0];
    let defaults = sanitizer.sanitize(&usage.options, &usage.widget_type, Some(usage_table));
    assert_eq!(defaults["groupBy"].value, json!({ "data": "service", "count": 10 }));
    assert_eq!(defaults["dataField"].value, json!({ "data": ["usage"] }));
}

#[test]
fn test_shared_template_round_trip() {
    let fixture = load();
    let (shared, selected) = share_data_tables(fixture.widget_data_tables("w-usage"), Some("dt-5"));
    assert_eq!(selected, Some(0));

    let template = serde_json::to_string(&shared).unwrap();
    let parsed: Vec<SharedDataTableInfo> = serde_json::from_str(&template).unwrap();
    let records = instantiate_data_tables(&parsed, |i, _| format!("imported-{i}")).unwrap();

    assert_eq!(records[0].id, "imported-0");
    assert_eq!(records[0].name.as_deref(), Some("Usage"));
}
