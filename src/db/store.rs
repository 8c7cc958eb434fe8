use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::pool::Pool;
use super::schema::quote_identifier;
use crate::error::StoreError;
use crate::import::sanitize::unescape;
use crate::import::{ImportOutcome, ImportRecord, RecordStore};

/// What to do with a record whose match column value already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Always insert; unique constraints decide
    #[default]
    Insert,
    /// Overwrite the existing row
    Update,
    /// Leave the existing row alone
    Skip,
}

impl DuplicatePolicy {
    /// Parse policy from string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "insert" => Ok(DuplicatePolicy::Insert),
            "update" => Ok(DuplicatePolicy::Update),
            "skip" => Ok(DuplicatePolicy::Skip),
            _ => Err(anyhow::anyhow!(
                "Unsupported duplicate policy: {}. Supported policies: insert, update, skip",
                s
            )),
        }
    }
}

/// Record store writing into one SQLite table
///
/// Values arrive escaped by the sanitizer and are unescaped again before
/// being bound as statement parameters.
///
/// Backslash pairs already present in the source data are decoded as well:
/// a Windows path such as `C:\new\path` is stored with a line feed in place
/// of `\n`. Pairs that are not escape sequences, like `\p`, are kept as written.
pub struct SqliteRecordStore {
    pool: Pool,
    table: String,
    match_column: Option<String>,
    policy: DuplicatePolicy,
}

impl SqliteRecordStore {
    pub fn new(pool: Pool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            match_column: None,
            policy: DuplicatePolicy::Insert,
        }
    }

    /// Look for existing rows by `column` and treat them per `policy`
    pub fn with_match(mut self, column: impl Into<String>, policy: DuplicatePolicy) -> Self {
        self.match_column = Some(column.into());
        self.policy = policy;
        self
    }

    async fn find_existing(&self, column: &str, key: &str) -> Result<Option<i64>, sqlx::Error> {
        let sql = format!(
            "SELECT rowid FROM {} WHERE {} = ? LIMIT 1",
            quote_identifier(&self.table),
            quote_identifier(column)
        );
        let row: Option<(i64,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(row.map(|(rowid,)| rowid))
    }

    async fn insert(&self, columns: &[String], values: &[String]) -> Result<(), sqlx::Error> {
        let column_list = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&self.table),
            column_list,
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value.as_str());
        }
        query.execute(self.pool.inner()).await?;
        Ok(())
    }

    async fn update(
        &self,
        rowid: i64,
        columns: &[String],
        values: &[String],
    ) -> Result<(), sqlx::Error> {
        let assignments = columns
            .iter()
            .map(|c| format!("{} = ?", quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE rowid = ?",
            quote_identifier(&self.table),
            assignments
        );

        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value.as_str());
        }
        query.bind(rowid).execute(self.pool.inner()).await?;
        Ok(())
    }

    async fn write(&self, record: &ImportRecord<'_>) -> Result<ImportOutcome, sqlx::Error> {
        let values: Vec<String> = record.values().iter().map(|v| unescape(v)).collect();

        if self.policy != DuplicatePolicy::Insert
            && let Some(column) = &self.match_column
            && let Some(key) = record.get(column)
            && let Some(rowid) = self.find_existing(column, &unescape(key)).await?
        {
            if self.policy == DuplicatePolicy::Skip {
                debug!(rowid, "skipping existing row");
                return Ok(ImportOutcome::Skipped);
            }
            self.update(rowid, record.columns(), &values).await?;
            return Ok(ImportOutcome::Updated);
        }

        self.insert(record.columns(), &values).await?;
        Ok(ImportOutcome::Inserted)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn store(&mut self, record: ImportRecord<'_>) -> Result<ImportOutcome, StoreError> {
        match self.write(&record).await {
            Ok(outcome) => Ok(outcome),
            // Constraint and type failures concern this row only
            Err(sqlx::Error::Database(e)) => Ok(ImportOutcome::Errored(e.message().to_string())),
            Err(e) => Err(StoreError::with_source(
                format!("could not write to table '{}'", self.table),
                e,
            )),
        }
    }
}
