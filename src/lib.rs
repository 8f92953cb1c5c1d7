//! # tablegraph - Dashboard Widget Data Table Graphs
//!
//! **tablegraph** models the data tables attached to a dashboard widget as a dependency
//! graph. A data table is either *raw* (fetched from a source) or *transformed*, built by
//! applying an operator to one parent (`PIVOT`, `QUERY`, `EVAL`, ...) or two parents
//! (`JOIN`, `CONCAT`).
//!
//! ## Core Workflow
//!
//! 1.  **Build the graph**: [`graph::DependencyGraph::build`] turns a widget's flat data
//!     table list into parent/child links, keyed by data table id.
//! 2.  **Cascade changes**: when a table's definition changes, [`cascade::CascadeUpdater`]
//!     re-submits every dependent table, parents strictly before children.
//! 3.  **Share**: [`share::SharedDashboardExporter`] converts a dashboard into a portable
//!     template in which every data table reference is a position in the widget's own
//!     `data_tables` array; [`share::instantiate_data_tables`] reverses it.
//! 4.  **Sanitize options**: [`sanitize::OptionsSanitizer`] drops or repairs widget
//!     options that refer to fields the selected data table no longer has.
//!
//! The backend is injected through [`backend::DataTableSource`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablegraph::prelude::*;
//! use serde_json::json;
//!
//! let records = vec![
//!     DataTableRecord::raw("dt-1"),
//!     DataTableRecord::raw("dt-2"),
//!     DataTableRecord::transformed("dt-3", Operator::Concat, json!({ "data_tables": ["dt-1", "dt-2"] })),
//! ];
//!
//! let graph = DependencyGraph::build(&records);
//! assert_eq!(graph.parents("dt-3"), ["dt-1".to_string(), "dt-2".to_string()]);
//!
//! let widget = WidgetRecord::new("w-1", "table").with_data_table("dt-3");
//! let shared = share_widget(&widget, &records);
//! assert_eq!(shared.data_table_id, 2);
//! assert_eq!(shared.data_tables[2].options["CONCAT"]["data_tables"], json!([0, 1]));
//! ```

pub mod backend;
pub mod cascade;
pub mod error;
pub mod fixture;
pub mod graph;
pub mod model;
pub mod prelude;
pub mod sanitize;
pub mod share;
