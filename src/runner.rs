//! High-level runner API for the CSV importer.
//!
//! This module wires the upload, database and import layers together behind a
//! single call. It is the primary API for external users and for the CLI.

use anyhow::{Context, Result};
use chrono::Utc;
use derive_builder::Builder;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::pool::PoolArgsBuilder;
use crate::db::{self as db_pool, DuplicatePolicy, Pool, SqliteRecordStore};
use crate::error::ImportError;
use crate::formats::Dialect;
use crate::import::{
    ImportSession, ImportStats, RecordStore, SchemaProvider, SessionStatus, Severity,
    WorkingSchema,
};
use crate::io::{FileStore, LocalFileStore, stage_upload};

/// Arguments for running an import
#[derive(Debug, Clone, Builder)]
pub struct ImportArgs {
    /// SQLite connection URL, e.g. `sqlite://data.db`
    #[builder(setter(into))]
    pub database_url: String,
    #[builder(setter(into))]
    pub table: String,
    /// Path or `file://` URI of the upload
    #[builder(setter(into))]
    pub source_uri: String,
    /// Directory the upload is staged in while it is imported
    #[builder(default = "default_upload_dir()")]
    pub upload_dir: PathBuf,
    /// Column used to find existing rows
    #[builder(default, setter(into, strip_option))]
    pub match_column: Option<String>,
    #[builder(default)]
    pub on_duplicate: DuplicatePolicy,
    /// Create the SQLite database file if it does not exist yet
    #[builder(default)]
    pub create_database: bool,
}

fn default_upload_dir() -> PathBuf {
    std::env::temp_dir().join("csv-importer-uploads")
}

/// Consolidated outcome of one import
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub session_id: Uuid,
    pub source: String,
    pub status: SessionStatus,
    pub stats: ImportStats,
    pub dialect: Option<Dialect>,
    pub working_schema: Option<WorkingSchema>,
    /// Heading of the error that stopped the import
    pub abort_reason: Option<String>,
    pub started_at: String,
    pub completed_at: String,
}

impl ImportReport {
    pub fn is_aborted(&self) -> bool {
        self.status == SessionStatus::Aborted
    }
}

/// Run an import with the specified arguments
///
/// Connects to the database, reads the target table's columns, then stages,
/// imports and removes the upload. Setup failures (connection, unknown table,
/// bad match column) are returned as errors; everything after that is
/// described by the returned report.
///
/// # Example
///
/// ```no_run
/// use csv_importer::runner::{ImportArgsBuilder, run_import};
///
/// # async fn example() -> anyhow::Result<()> {
/// let args = ImportArgsBuilder::default()
///     .database_url("sqlite://contacts.db")
///     .table("contacts")
///     .source_uri("/tmp/contacts.csv")
///     .build()?;
///
/// let report = run_import(args).await?;
/// println!("Imported {} records", report.stats.imported());
/// # Ok(())
/// # }
/// ```
pub async fn run_import(args: ImportArgs) -> Result<ImportReport> {
    let pool = connect(&args.database_url, args.create_database).await?;
    import_with_pool(pool, &args).await
}

/// Run an import against an already connected pool
pub(crate) async fn import_with_pool(pool: Pool, args: &ImportArgs) -> Result<ImportReport> {
    let table_schema = db_pool::query_table_schema(&pool, &args.table).await?;
    info!(
        table = %args.table,
        columns = table_schema.columns().len(),
        "loaded target table schema"
    );

    let mut record_store = SqliteRecordStore::new(pool, &args.table);
    if let Some(column) = &args.match_column {
        if !table_schema.is_valid_column(column) {
            anyhow::bail!("Match column '{}' is not a column of '{}'", column, args.table);
        }
        record_store = record_store.with_match(column, args.on_duplicate);
    }

    let file_store = LocalFileStore::new(&args.upload_dir);
    Ok(import_file(&args.source_uri, &file_store, &table_schema, &mut record_store).await)
}

async fn connect(database_url: &str, create_if_missing: bool) -> Result<Pool> {
    let pool_args = PoolArgsBuilder::default()
        .url(database_url)
        .create_if_missing(create_if_missing)
        .build()?;
    db_pool::pool::pool(pool_args)
        .await
        .with_context(|| format!("Failed to connect to {}", database_url))
}

/// Stage, import and remove one upload
///
/// The staged copy is deleted whatever the outcome; a failed delete is only
/// logged.
pub async fn import_file(
    source_uri: &str,
    file_store: &dyn FileStore,
    schema: &dyn SchemaProvider,
    record_store: &mut dyn RecordStore,
) -> ImportReport {
    let session_id = Uuid::new_v4();
    let started_at = Utc::now().to_rfc3339();
    info!(%session_id, source = source_uri, "starting import");

    let staged = match stage_upload(source_uri, file_store).await {
        Ok(staged) => staged,
        Err(e) => return rejected(session_id, source_uri, started_at, e),
    };

    let content = file_store.read(&staged.path).await;

    let report = match content {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let result = ImportSession::new(schema, record_store).run(&text).await;
            ImportReport {
                session_id,
                source: staged.original_name.clone(),
                status: result.status,
                stats: result.stats,
                dialect: result.dialect,
                working_schema: result.working_schema,
                abort_reason: result.error.as_ref().map(|e| e.heading().to_string()),
                started_at,
                completed_at: Utc::now().to_rfc3339(),
            }
        }
        Err(source) => rejected(
            session_id,
            source_uri,
            started_at,
            ImportError::FileSystem {
                heading: "The uploaded file could not be read.".to_string(),
                destination: staged.path.clone(),
                source,
            },
        ),
    };

    if let Err(e) = file_store.delete(&staged.path).await {
        warn!(path = %staged.path.display(), "Failed to delete staged upload: {}", e);
    }

    report
}

/// Report for an import that failed before any row was read
fn rejected(
    session_id: Uuid,
    source_uri: &str,
    started_at: String,
    error: ImportError,
) -> ImportReport {
    warn!(%session_id, "Import rejected: {}", error);

    let mut stats = ImportStats::new();
    stats.push(Severity::Error, error.heading());
    let detail = match &error {
        ImportError::UploadValidation(detail) => detail.clone(),
        other => other.to_string(),
    };
    if detail != error.heading() {
        stats.push(Severity::Error, detail);
    }

    ImportReport {
        session_id,
        source: source_uri.to_string(),
        status: SessionStatus::Aborted,
        stats,
        dialect: None,
        working_schema: None,
        abort_reason: Some(error.heading().to_string()),
        started_at,
        completed_at: Utc::now().to_rfc3339(),
    }
}
