use anyhow::{Context, Result};
use serde::Serialize;

use super::pool::Pool;
use crate::import::SchemaProvider;

/// A column of an existing table
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: String,
    pub declared_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// Column list of the target table, read once before an import starts
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<Column>,
    #[serde(skip)]
    names: Vec<String>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, columns: Vec<Column>) -> Self {
        let names = columns.iter().map(|c| c.name.clone()).collect();
        Self {
            table: table.into(),
            columns,
            names,
        }
    }

    /// Primary key column, when the table has exactly one
    pub fn primary_key(&self) -> Option<&str> {
        let mut keys = self.columns.iter().filter(|c| c.primary_key);
        match (keys.next(), keys.next()) {
            (Some(key), None) => Some(&key.name),
            _ => None,
        }
    }
}

impl SchemaProvider for TableSchema {
    fn columns(&self) -> &[String] {
        &self.names
    }
}

/// Quote an identifier for use in generated SQL
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Query the schema of an existing table from the database
pub async fn query_table_schema(pool: &Pool, table_name: &str) -> Result<TableSchema> {
    let query = format!("PRAGMA table_info({})", quote_identifier(table_name));

    // cid, name, type, notnull, dflt_value, pk
    let rows: Vec<(i64, String, String, i64, Option<String>, i64)> = sqlx::query_as(&query)
        .fetch_all(pool.inner())
        .await
        .context("Failed to query table schema")?;

    if rows.is_empty() {
        anyhow::bail!("Table '{}' not found or has no columns", table_name);
    }

    let columns = rows
        .into_iter()
        .map(|(_, name, declared_type, notnull, _, pk)| Column {
            name,
            declared_type,
            nullable: notnull == 0,
            primary_key: pk > 0,
        })
        .collect();

    Ok(TableSchema::new(table_name, columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[tokio::test]
    async fn test_query_table_schema_keeps_column_order() {
        let pool = Pool::sqlite_in_memory().await.unwrap();
        pool.execute_query(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, email TEXT NOT NULL, name TEXT)",
        )
        .await
        .unwrap();

        let schema = query_table_schema(&pool, "people").await.unwrap();

        assert_eq!(schema.columns(), &["id", "email", "name"]);
        assert!(!schema.columns[1].nullable);
        assert!(schema.columns[2].nullable);
        assert_eq!(schema.columns[0].declared_type, "INTEGER");
        assert_eq!(schema.primary_key(), Some("id"));
        assert!(schema.is_valid_column("email"));
        assert!(!schema.is_valid_column("Email"));
    }

    #[tokio::test]
    async fn test_composite_key_has_no_single_primary_key() {
        let pool = Pool::sqlite_in_memory().await.unwrap();
        pool.execute_query("CREATE TABLE pairs (a TEXT, b TEXT, PRIMARY KEY (a, b))")
            .await
            .unwrap();

        let schema = query_table_schema(&pool, "pairs").await.unwrap();
        assert_eq!(schema.primary_key(), None);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let pool = Pool::sqlite_in_memory().await.unwrap();
        let err = query_table_schema(&pool, "nope").await.unwrap_err();
        assert!(err.to_string().contains("Table 'nope' not found"));
    }
}
