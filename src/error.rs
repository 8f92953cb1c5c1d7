use thiserror::Error;

/// Error type returned by injected backend operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while cascading an update through a widget's data tables.
#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("Failed to update data table '{data_table_id}': {source}")]
    UpdateFailed {
        data_table_id: String,
        #[source]
        source: BoxError,
    },

    #[error("Data table dependency cycle detected: {}", cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },
}

/// Errors that can occur when turning a shared template back into data tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Shared data tables reference each other in a cycle: {indices:?}")]
    CycleDetected { indices: Vec<usize> },
}

/// Errors that can occur when loading a dashboard fixture.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Could not read fixture '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture JSON: {0}")]
    Json(#[from] serde_json::Error),
}
