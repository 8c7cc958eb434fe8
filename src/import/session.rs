//! The import state machine
//!
//! `Idle → Sniffing → Parsing → Reconciling → RowLoop → Completed`, or
//! `Aborted` when the header is rejected, a row has the wrong width, or the
//! store fails for good. Rows already stored before an abort stay stored.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::reconcile::{Reconciliation, reconcile};
use super::record::{ImportRecord, WorkingSchema};
use super::sanitize::sanitize;
use super::stats::{ImportStats, Severity};
use super::store::{RecordStore, SchemaProvider};
use crate::error::ImportError;
use crate::formats::{Dialect, RawRow, RecordParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Sniffing,
    Parsing,
    Reconciling,
    RowLoop,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Completed,
    Aborted,
}

/// Everything a finished session hands back to its caller
#[derive(Debug)]
pub struct SessionResult {
    pub status: SessionStatus,
    pub stats: ImportStats,
    pub dialect: Option<Dialect>,
    pub working_schema: Option<WorkingSchema>,
    /// The error that aborted the session
    pub error: Option<ImportError>,
}

/// One import of one file into one record store
///
/// The session owns its statistics for its whole lifetime and gives them
/// back by value from [`ImportSession::run`]. Rows are stored strictly in
/// file order, one at a time.
pub struct ImportSession<'a> {
    schema: &'a dyn SchemaProvider,
    store: &'a mut dyn RecordStore,
    state: SessionState,
    stats: ImportStats,
}

impl<'a> ImportSession<'a> {
    pub fn new(schema: &'a dyn SchemaProvider, store: &'a mut dyn RecordStore) -> Self {
        Self {
            schema,
            store,
            state: SessionState::Idle,
            stats: ImportStats::new(),
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Import session: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Import the full text of a delimited file
    pub async fn run(mut self, text: &str) -> SessionResult {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        self.transition(SessionState::Sniffing);
        let dialect = Dialect::sniff(text);
        info!(
            "Detected delimiter '{}' and enclosure '{}'",
            dialect.delimiter_as_string(),
            dialect.enclosure_as_string()
        );

        self.transition(SessionState::Parsing);
        let mut parser = RecordParser::new(text, dialect);
        let first_row = parser.next();
        self.collect_diagnostics(&mut parser);

        self.transition(SessionState::Reconciling);
        let Some(first_row) = first_row else {
            info!("File contains no rows");
            self.stats.push(Severity::Info, "Zero records imported");
            return self.complete(dialect, None);
        };

        let (working_schema, pending) = match reconcile(self.schema, &first_row, dialect.enclosure)
        {
            Ok(Reconciliation::Header(schema)) => (schema, None),
            Ok(Reconciliation::Data(schema)) => (schema, Some(first_row)),
            Err(e) => return self.abort(e, dialect, None),
        };

        self.transition(SessionState::RowLoop);
        let mut next_row = pending;
        loop {
            let row = match next_row.take() {
                Some(row) => row,
                None => match parser.next() {
                    Some(row) => row,
                    None => break,
                },
            };
            self.collect_diagnostics(&mut parser);

            if let Err(e) = self.import_row(&working_schema, row, dialect.enclosure).await {
                return self.abort(e, dialect, Some(working_schema));
            }
        }

        info!(
            "Import complete: {} inserted, {} updated, {} skipped, {} errored",
            self.stats.inserted, self.stats.updated, self.stats.skipped, self.stats.errored
        );
        self.complete(dialect, Some(working_schema))
    }

    /// Sanitize, validate and store one data row
    async fn import_row(
        &mut self,
        working_schema: &WorkingSchema,
        row: RawRow,
        enclosure: u8,
    ) -> Result<(), ImportError> {
        let values: Vec<String> = row
            .fields
            .iter()
            .map(|field| sanitize(field, enclosure))
            .collect();

        let record = ImportRecord::new(working_schema, values).map_err(|mismatch| {
            ImportError::SchemaMismatch {
                line: row.line,
                expected: mismatch.expected,
                actual: mismatch.actual,
            }
        })?;

        let outcome = self.store.store(record).await?;
        debug!("Line {}: {:?}", row.line, outcome);
        self.stats.record(row.line, outcome);
        Ok(())
    }

    fn collect_diagnostics(&mut self, parser: &mut RecordParser<'_>) {
        for diagnostic in parser.drain_diagnostics() {
            self.stats.push(Severity::Warning, diagnostic.message);
        }
    }

    fn complete(mut self, dialect: Dialect, working_schema: Option<WorkingSchema>) -> SessionResult {
        self.transition(SessionState::Completed);
        SessionResult {
            status: SessionStatus::Completed,
            stats: self.stats,
            dialect: Some(dialect),
            working_schema,
            error: None,
        }
    }

    fn abort(
        mut self,
        error: ImportError,
        dialect: Dialect,
        working_schema: Option<WorkingSchema>,
    ) -> SessionResult {
        warn!("Import aborted: {}", error);
        self.transition(SessionState::Aborted);
        self.stats.push(Severity::Error, error.to_string());
        SessionResult {
            status: SessionStatus::Aborted,
            stats: self.stats,
            dialect: Some(dialect),
            working_schema,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::stats::ImportOutcome;
    use crate::import::store::StaticSchema;
    use crate::import::store::testing::MemoryStore;

    #[tokio::test]
    async fn test_end_to_end_two_inserts() {
        let schema = StaticSchema::new(["name", "email"]);
        let mut store = MemoryStore::default();

        let text = "name,email\n\"Jane, A\",jane@example.com\nBob,bob@example.com\n";
        let result = ImportSession::new(&schema, &mut store).run(text).await;

        assert_eq!(result.status, SessionStatus::Completed);
        assert_eq!(result.dialect, Some(Dialect::new(b',', b'"')));
        assert_eq!(
            (
                result.stats.inserted,
                result.stats.updated,
                result.stats.skipped,
                result.stats.errored
            ),
            (2, 0, 0, 0)
        );
        assert_eq!(
            store.rows,
            vec![
                vec![
                    ("name".to_string(), "Jane, A".to_string()),
                    ("email".to_string(), "jane@example.com".to_string()),
                ],
                vec![
                    ("name".to_string(), "Bob".to_string()),
                    ("email".to_string(), "bob@example.com".to_string()),
                ],
            ]
        );
    }

    #[tokio::test]
    async fn test_header_order_from_file_is_used() {
        let schema = StaticSchema::new(["a", "b", "c"]);
        let mut store = MemoryStore::default();

        let result = ImportSession::new(&schema, &mut store)
            .run("b,a,c\n2,1,3\n")
            .await;

        let working: Vec<&str> = result
            .working_schema
            .as_ref()
            .unwrap()
            .columns()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(working, vec!["b", "a", "c"]);
        assert_eq!(store.rows[0][0], ("b".to_string(), "2".to_string()));
    }

    #[tokio::test]
    async fn test_headerless_file_uses_configured_schema() {
        let schema = StaticSchema::new(["id", "score"]);
        let mut store = MemoryStore::default();

        let result = ImportSession::new(&schema, &mut store)
            .run("1,10\n2,20\n")
            .await;

        assert_eq!(result.status, SessionStatus::Completed);
        assert_eq!(result.stats.inserted, 2);
        assert_eq!(store.rows[0][0], ("id".to_string(), "1".to_string()));
    }

    #[tokio::test]
    async fn test_extra_field_aborts_with_line_and_counts() {
        let schema = StaticSchema::new(["a", "b"]);
        let mut store = MemoryStore::default();

        let text = "a,b\n1,2\n3,4,5\n6,7\n";
        let result = ImportSession::new(&schema, &mut store).run(text).await;

        assert_eq!(result.status, SessionStatus::Aborted);
        assert_eq!(result.stats.inserted, 1);
        assert_eq!(store.rows.len(), 1, "no rows after the mismatch are stored");
        assert!(matches!(
            result.error,
            Some(ImportError::SchemaMismatch {
                line: 3,
                expected: 2,
                actual: 3
            })
        ));
        let last = result.stats.messages.last().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert!(last.text.contains("line 3"));
        assert!(last.text.contains("There are 3"));
        assert!(last.text.contains("should be 2"));
    }

    async fn mismatch_line(text: &str) -> Option<u64> {
        let schema = StaticSchema::new(["a", "b"]);
        let mut store = MemoryStore::default();
        match ImportSession::new(&schema, &mut store).run(text).await.error {
            Some(ImportError::SchemaMismatch {
                line,
                expected: 2,
                actual: 3,
            }) => Some(line),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_mismatch_line_counts_physical_lines() {
        assert_eq!(mismatch_line("a,b\r\n1,2\r\n3,4,5\r\n").await, Some(3));
        assert_eq!(mismatch_line("a,b\r1,2\r3,4,5\r").await, Some(3));
        assert_eq!(mismatch_line("a,b\n1,2\n\n3,4,5\n").await, Some(4));
        assert_eq!(mismatch_line("\u{feff}a,b\r\n\r\n1,2\r\n3,4,5").await, Some(4));
    }

    #[tokio::test]
    async fn test_missing_field_aborts_before_storing_anything() {
        let schema = StaticSchema::new(["a", "b"]);
        let mut store = MemoryStore::default();

        let result = ImportSession::new(&schema, &mut store)
            .run("a,b\n1\n2,3\n")
            .await;

        assert_eq!(result.status, SessionStatus::Aborted);
        assert!(store.rows.is_empty());
        assert!(matches!(
            result.error,
            Some(ImportError::SchemaMismatch {
                line: 2,
                expected: 2,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_skipped_and_errored_rows_do_not_abort() {
        let schema = StaticSchema::new(["a"]);
        let mut store = MemoryStore {
            script: vec![
                ImportOutcome::Skipped,
                ImportOutcome::Errored("value too long".to_string()),
                ImportOutcome::Updated,
                ImportOutcome::Inserted,
            ],
            ..Default::default()
        };

        let result = ImportSession::new(&schema, &mut store)
            .run("a\n1\n2\n3\n4\n")
            .await;

        assert_eq!(result.status, SessionStatus::Completed);
        assert_eq!(
            (
                result.stats.inserted,
                result.stats.updated,
                result.stats.skipped,
                result.stats.errored
            ),
            (1, 1, 1, 1)
        );
        assert!(
            result
                .stats
                .messages
                .iter()
                .any(|m| m.text == "Line 3: value too long")
        );
    }

    #[tokio::test]
    async fn test_store_failure_aborts() {
        let schema = StaticSchema::new(["a"]);
        let mut store = MemoryStore {
            fail_on_call: Some(1),
            ..Default::default()
        };

        let result = ImportSession::new(&schema, &mut store)
            .run("a\n1\n2\n3\n")
            .await;

        assert_eq!(result.status, SessionStatus::Aborted);
        assert_eq!(result.stats.inserted, 1);
        assert!(matches!(result.error, Some(ImportError::Store(_))));
    }

    #[tokio::test]
    async fn test_rejected_header_aborts_before_row_loop() {
        let schema = StaticSchema::new(["name", "email"]);
        let mut store = MemoryStore::default();

        let result = ImportSession::new(&schema, &mut store)
            .run("name,nickname\nBob,B\n")
            .await;

        assert_eq!(result.status, SessionStatus::Aborted);
        assert!(result.working_schema.is_none());
        assert!(store.rows.is_empty());
        assert!(matches!(result.error, Some(ImportError::UnknownColumns(_))));
    }

    #[tokio::test]
    async fn test_empty_file_completes_with_zero_counts() {
        let schema = StaticSchema::new(["a"]);
        let mut store = MemoryStore::default();

        let result = ImportSession::new(&schema, &mut store).run("").await;

        assert_eq!(result.status, SessionStatus::Completed);
        assert_eq!(result.stats.imported(), 0);
        assert_eq!(result.stats.messages[0].text, "Zero records imported");
    }

    #[tokio::test]
    async fn test_byte_order_mark_is_ignored() {
        let schema = StaticSchema::new(["name"]);
        let mut store = MemoryStore::default();

        let result = ImportSession::new(&schema, &mut store)
            .run("\u{feff}name\nAnn\n")
            .await;

        assert_eq!(result.stats.inserted, 1);
        assert_eq!(store.rows[0][0], ("name".to_string(), "Ann".to_string()));
    }

    #[tokio::test]
    async fn test_parse_diagnostics_become_warnings() {
        let schema = StaticSchema::new(["a", "b"]);
        let mut store = MemoryStore::default();

        let result = ImportSession::new(&schema, &mut store)
            .run("a,b\nx\"y,z\n")
            .await;

        assert_eq!(result.status, SessionStatus::Completed);
        assert_eq!(result.stats.inserted, 1);
        assert!(
            result
                .stats
                .messages
                .iter()
                .any(|m| m.severity == Severity::Warning && m.text.contains("line 2"))
        );
        assert_eq!(store.rows[0][0], ("a".to_string(), "x\\\"y".to_string()));
    }

    #[tokio::test]
    async fn test_values_are_sanitized_before_storing() {
        let schema = StaticSchema::new(["name", "tags"]);
        let mut store = MemoryStore::default();

        let text = "name;tags\n'O''Brien';'[\"red\",\"blue\"]'\n";
        let result = ImportSession::new(&schema, &mut store).run(text).await;

        assert_eq!(result.dialect, Some(Dialect::new(b';', b'\'')));
        assert_eq!(
            store.rows[0],
            vec![
                ("name".to_string(), "O\\'Brien".to_string()),
                ("tags".to_string(), "red,blue".to_string()),
            ]
        );
    }
}
