use async_trait::async_trait;

use super::record::ImportRecord;
use super::stats::ImportOutcome;
use crate::error::StoreError;

/// Source of the canonical column list for the import target
pub trait SchemaProvider: Send + Sync {
    /// Column names in their canonical order
    fn columns(&self) -> &[String];

    /// Whether a header cell names a column the target accepts
    fn is_valid_column(&self, name: &str) -> bool {
        self.columns().iter().any(|c| c == name)
    }
}

/// Persistence target for imported records
///
/// Duplicate handling and row-level validation failures are reported through
/// [`ImportOutcome`]; `Err` is reserved for failures after which no further
/// row can be stored.
#[async_trait]
pub trait RecordStore: Send {
    async fn store(&mut self, record: ImportRecord<'_>) -> Result<ImportOutcome, StoreError>;
}

/// A fixed column list, for callers that already know their schema
#[derive(Debug, Clone)]
pub struct StaticSchema {
    columns: Vec<String>,
}

impl StaticSchema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl SchemaProvider for StaticSchema {
    fn columns(&self) -> &[String] {
        &self.columns
    }
}
