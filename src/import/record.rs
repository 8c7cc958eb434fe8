use serde::Serialize;

/// Ordered column names used for one import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkingSchema {
    columns: Vec<String>,
}

impl WorkingSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of fields every data row must have
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// A row whose width did not match the working schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCountMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// One sanitized row keyed by the working schema
///
/// The only constructor checks the width, so every record has exactly one
/// value per schema column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord<'a> {
    schema: &'a WorkingSchema,
    values: Vec<String>,
}

impl<'a> ImportRecord<'a> {
    pub fn new(schema: &'a WorkingSchema, values: Vec<String>) -> Result<Self, FieldCountMismatch> {
        if values.len() != schema.width() {
            return Err(FieldCountMismatch {
                expected: schema.width(),
                actual: values.len(),
            });
        }
        Ok(Self { schema, values })
    }

    pub fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema
            .columns()
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx].as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}
