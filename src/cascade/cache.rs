use crate::model::DataTableRecord;

/// The locally cached data table list of one widget.
///
/// The cascade reads current definitions from here and patches in each
/// recomputed record, so later reads see fresh data without a refetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTableCache {
    records: Vec<DataTableRecord>,
}

impl DataTableCache {
    pub fn new(records: Vec<DataTableRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[DataTableRecord] {
        &self.records
    }

    pub fn get(&self, data_table_id: &str) -> Option<&DataTableRecord> {
        self.records.iter().find(|r| r.id == data_table_id)
    }

    /// Swaps in `record` for the cached entry with the same id.
    ///
    /// Returns `false` and leaves the cache untouched when no entry matches.
    pub fn replace(&mut self, record: DataTableRecord) -> bool {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn into_records(self) -> Vec<DataTableRecord> {
        self.records
    }
}

impl From<Vec<DataTableRecord>> for DataTableCache {
    fn from(records: Vec<DataTableRecord>) -> Self {
        Self::new(records)
    }
}
