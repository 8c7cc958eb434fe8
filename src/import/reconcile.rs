use std::collections::HashSet;
use tracing::{debug, info};

use super::record::WorkingSchema;
use super::sanitize::strip_enclosure;
use super::store::SchemaProvider;
use crate::error::ImportError;
use crate::formats::RawRow;

/// How the first row of the file was interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The first row named the columns and has been consumed
    Header(WorkingSchema),
    /// The first row shares no names with the schema and is data
    Data(WorkingSchema),
}

impl Reconciliation {
    pub fn schema(&self) -> &WorkingSchema {
        match self {
            Reconciliation::Header(schema) | Reconciliation::Data(schema) => schema,
        }
    }
}

/// Decide the working schema from the configured schema and the first row
///
/// - a first row naming none of the configured columns is data, and the
///   configured order is used;
/// - a first row repeating the configured columns in order is a header for
///   the configured order;
/// - any other first row is a header whose order wins, provided every name
///   is accepted by the provider and none repeats.
pub fn reconcile(
    provider: &dyn SchemaProvider,
    first_row: &RawRow,
    enclosure: u8,
) -> Result<Reconciliation, ImportError> {
    let configured = provider.columns();
    let candidates: Vec<String> = first_row
        .fields
        .iter()
        .map(|cell| strip_enclosure(cell.trim(), enclosure).trim().to_string())
        .collect();

    if candidates.as_slice() == configured {
        debug!("Header matches the configured columns");
        return Ok(Reconciliation::Header(WorkingSchema::new(
            configured.to_vec(),
        )));
    }

    if !candidates.iter().any(|c| provider.is_valid_column(c)) {
        info!("First row names no known column, treating it as data");
        return Ok(Reconciliation::Data(WorkingSchema::new(configured.to_vec())));
    }

    let unknown: Vec<String> = candidates
        .iter()
        .filter(|c| !provider.is_valid_column(c))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ImportError::UnknownColumns(unknown));
    }

    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for name in &candidates {
        if !seen.insert(name.as_str()) && !duplicates.contains(name) {
            duplicates.push(name.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(ImportError::DuplicateColumns(duplicates));
    }

    info!("Using column order from the file: {}", candidates.join(", "));
    Ok(Reconciliation::Header(WorkingSchema::new(candidates)))
}
