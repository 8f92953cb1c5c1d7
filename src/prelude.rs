//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to build graphs, cascade updates,
//! share dashboards and sanitize widget options.

// Graph
pub use crate::graph::{DataTableReference, DependencyGraph, GraphBuilder, execution_order};

// Records
pub use crate::model::{
    DashboardLayout, DataTableRecord, DataTableUpdate, DataTarget, DataType, FieldValue,
    Operator, SharedDashboardLayout, SharedDataTableInfo, SharedWidgetInfo, WidgetOptions,
    WidgetRecord,
};

// Backend seams
pub use crate::backend::{CostDataSourceLookup, DataTableSource};

// Operations
pub use crate::cascade::{CascadeReport, CascadeUpdater, DataTableCache, FailurePolicy};
pub use crate::sanitize::{FieldOptions, OptionsSanitizer, WidgetConfig, WidgetConfigSource};
pub use crate::share::{
    SharedDashboardExporter, creation_order, instantiate_data_tables, resolve_shared_reference,
    share_data_tables, share_widget,
};

// Error types
pub use crate::error::{BoxError, CascadeError, ImportError};
