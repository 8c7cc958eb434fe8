use clap::{Parser, Subcommand};
use csv_importer::DuplicatePolicy;
use csv_importer::import::Severity;
use csv_importer::runner::{ImportArgsBuilder, ImportReport, run_import};
use std::path::PathBuf;

#[derive(Parser, Clone)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Subcommand)]
enum Command {
    Import {
        /// SQLite database (path or sqlite:// URL)
        #[arg(short, long)]
        database: String,

        /// Target table name
        #[arg(short, long)]
        table: String,

        /// Path to the .csv file to import (local path or file:// URI)
        #[arg(short, long)]
        file: String,

        /// Directory the upload is staged in (default: system temp directory)
        #[arg(long)]
        upload_dir: Option<String>,

        /// Column used to detect rows that already exist
        #[arg(short, long)]
        match_column: Option<String>,

        /// What to do with rows that already exist (insert, update, skip)
        #[arg(long, default_value = "insert")]
        on_duplicate: String,

        /// Create the database file if it does not exist
        #[arg(long)]
        create_db: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Quiet mode - minimal output, only show summary
        #[arg(short, long)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Import {
            database,
            table,
            file,
            upload_dir,
            match_column,
            on_duplicate,
            create_db,
            json,
            quiet,
        } => {
            run_importer(
                database,
                table,
                file,
                upload_dir,
                match_column,
                on_duplicate,
                create_db,
                json,
                quiet,
            )
            .await?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_importer(
    database: String,
    table: String,
    file: String,
    upload_dir: Option<String>,
    match_column: Option<String>,
    on_duplicate: String,
    create_db: bool,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    // Initialize tracing based on quiet mode
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if quiet || json {
        EnvFilter::new("csv_importer=warn,sqlx=off")
    } else {
        EnvFilter::new("csv_importer=info,sqlx=off")
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if !quiet && !json {
        println!("CSV Importer");
        println!("============");
        println!("Database: {}", database);
        println!("File: {}", file);
        println!("Table: {}", table);
        println!();
    }

    let mut builder = ImportArgsBuilder::default();
    builder
        .database_url(cli::database_url(&database))
        .table(table)
        .source_uri(file)
        .on_duplicate(DuplicatePolicy::parse(&on_duplicate)?)
        .create_database(create_db);
    if let Some(dir) = upload_dir {
        builder.upload_dir(PathBuf::from(dir));
    }
    if let Some(column) = match_column {
        builder.match_column(column);
    }

    let report = run_import(builder.build()?).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if report.is_aborted() {
        anyhow::bail!(
            "Import aborted: {}",
            report.abort_reason.as_deref().unwrap_or("unknown reason")
        );
    }
    Ok(())
}

fn print_summary(report: &ImportReport) {
    println!();
    println!("Import Summary");
    println!("==============");
    println!("Session ID: {}", report.session_id);
    println!("Source: {}", report.source);
    if let Some(dialect) = &report.dialect {
        println!(
            "Dialect: delimiter '{}', enclosure '{}'",
            dialect.delimiter_as_string(),
            dialect.enclosure_as_string()
        );
    }
    if let Some(schema) = &report.working_schema {
        println!("Columns: {}", schema.columns().join(", "));
    }
    for line in report.stats.summary_lines() {
        println!("{}", line);
    }

    if !report.stats.messages.is_empty() {
        println!();
        println!("Messages:");
        for message in &report.stats.messages {
            let tag = match message.severity {
                Severity::Info => "info",
                Severity::Warning => "warning",
                Severity::Error => "error",
            };
            println!("  [{}] {}", tag, message.text);
        }
    }
}

/// CLI utility functions for parsing command-line arguments
mod cli {
    /// Accept a bare file path wherever a sqlite URL is expected
    pub fn database_url(database: &str) -> String {
        if database.starts_with("sqlite:") {
            database.to_string()
        } else {
            format!("sqlite://{}", database)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_database_url() {
            assert_eq!(database_url("data.db"), "sqlite://data.db");
            assert_eq!(database_url("sqlite://data.db"), "sqlite://data.db");
            assert_eq!(database_url("sqlite::memory:"), "sqlite::memory:");
        }
    }
}
