mod common;

use common::*;
use serde_json::json;
use tablegraph::prelude::*;
use tokio_test::block_on;

#[test]
fn test_chain_updates_parent_before_child() {
    let source = source_for("w-1", chain_tables());
    let mut cache = DataTableCache::new(chain_tables());

    let report = block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "a")).unwrap();

    assert_eq!(source.update_log(), vec!["b", "c"]);
    assert_eq!(report.updated, vec!["b", "c"]);
    assert!(report.is_clean());
}

#[test]
fn test_leaf_change_issues_no_updates() {
    let source = source_for("w-1", chain_tables());
    let mut cache = DataTableCache::new(chain_tables());

    let report = block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "c")).unwrap();

    assert!(source.update_log().is_empty());
    assert!(report.updated.is_empty());
}

#[test]
fn test_unknown_id_issues_no_updates() {
    let source = source_for("w-1", chain_tables());
    let mut cache = DataTableCache::new(chain_tables());

    let report =
        block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "missing")).unwrap();

    assert!(source.update_log().is_empty());
    assert!(report.is_clean());
}

#[test]
fn test_subtree_finishes_before_next_sibling() {
    let source = source_for("w-1", branching_tables());
    let mut cache = DataTableCache::new(branching_tables());

    block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "root")).unwrap();

    // `joined` sits below both branches and is refreshed once per path.
    assert_eq!(
        source.update_log(),
        vec!["left", "left-leaf", "joined", "right", "joined"]
    );
}

#[test]
fn test_cache_receives_refreshed_records() {
    // The backend knows the columns `b` produces; the cached copy does not yet.
    let mut stored = chain_tables();
    stored[1] = stored[1].clone().with_data_keys(["cost", "usage"]);
    let source = source_for("w-1", stored);
    let mut cache = DataTableCache::new(chain_tables());

    block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "a")).unwrap();

    let refreshed = cache.get("b").unwrap();
    assert_eq!(refreshed.available_field_keys(DataTarget::DataInfo), vec!["cost", "usage"]);
    assert_eq!(cache.records().len(), 3);
}

#[test]
fn test_update_submits_cached_definition() {
    let source = source_for("w-1", chain_tables());
    let mut cached = chain_tables();
    cached[2]
        .options
        .insert("QUERY".into(), json!({ "data_table_id": "b", "query": "cost > 10" }));
    let mut cache = DataTableCache::new(cached);

    block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "a")).unwrap();

    let listed = block_on(source.list_data_tables("w-1")).unwrap();
    let c = listed.iter().find(|r| r.id == "c").unwrap();
    assert_eq!(c.options["QUERY"]["query"], json!("cost > 10"));
}

#[test]
fn test_failure_aborts_by_default() {
    let source = source_for("w-1", branching_tables()).with_failing_update("left");
    let mut cache = DataTableCache::new(branching_tables());

    let result = block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "root"));

    match result {
        Err(CascadeError::UpdateFailed { data_table_id, .. }) => assert_eq!(data_table_id, "left"),
        other => panic!("expected UpdateFailed, got {other:?}"),
    }
    assert_eq!(source.update_log(), vec!["left"]);
}

#[test]
fn test_failure_isolated_to_its_subtree() {
    let source = source_for("w-1", branching_tables()).with_failing_update("left");
    let mut cache = DataTableCache::new(branching_tables());

    let updater = CascadeUpdater::builder(&source)
        .with_failure_policy(FailurePolicy::IsolateSiblings)
        .build();
    let report = block_on(updater.cascade_update(&mut cache, "root")).unwrap();

    assert_eq!(source.update_log(), vec!["left", "right", "joined"]);
    assert_eq!(report.updated, vec!["right", "joined"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].data_table_id, "left");
    assert!(!report.is_clean());
}

#[test]
fn test_cycle_is_rejected_before_any_update() {
    let records = vec![
        unary("a", Operator::Eval, "c"),
        unary("b", Operator::Eval, "a"),
        unary("c", Operator::Eval, "b"),
    ];
    let source = source_for("w-1", records.clone());
    let mut cache = DataTableCache::new(records);

    let result = block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "a"));

    match result {
        Err(CascadeError::CycleDetected { cycle }) => {
            assert_eq!(cycle, vec!["a", "b", "c", "a"]);
        }
        other => panic!("expected CycleDetected, got {other:?}"),
    }
    assert!(source.update_log().is_empty());
}

#[test]
fn test_uncached_table_is_skipped_but_its_dependents_are_not() {
    let source = source_for("w-1", chain_tables());
    let graph = DependencyGraph::build(&chain_tables());
    let mut cache = DataTableCache::new(
        chain_tables().into_iter().filter(|r| r.id != "b").collect(),
    );

    let report = block_on(
        CascadeUpdater::new(&source).cascade_update_in(&graph, &mut cache, "a"),
    )
    .unwrap();

    assert_eq!(report.skipped, vec!["b"]);
    assert_eq!(report.updated, vec!["c"]);
    assert_eq!(source.update_log(), vec!["c"]);
}

#[test]
fn test_shared_source_behind_arc() {
    let source = std::sync::Arc::new(source_for("w-1", chain_tables()));
    let mut cache = DataTableCache::new(chain_tables());

    block_on(CascadeUpdater::new(&source).cascade_update(&mut cache, "b")).unwrap();

    assert_eq!(source.update_log(), vec!["c"]);
}
