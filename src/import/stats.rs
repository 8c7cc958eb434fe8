use serde::Serialize;

/// Result of handing one record to the record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Inserted,
    Updated,
    Skipped,
    Errored(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub text: String,
    pub severity: Severity,
}

/// Counters and messages accumulated over one import
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errored: u64,
    pub messages: Vec<Message>,
}

impl ImportStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a store outcome for the row that started on `line`
    pub fn record(&mut self, line: u64, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Inserted => self.inserted += 1,
            ImportOutcome::Updated => self.updated += 1,
            ImportOutcome::Skipped => self.skipped += 1,
            ImportOutcome::Errored(reason) => {
                self.errored += 1;
                self.push(Severity::Error, format!("Line {}: {}", line, reason));
            }
        }
    }

    pub fn push(&mut self, severity: Severity, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.messages.push(Message { text, severity });
        }
    }

    /// Rows the store accepted as new or changed data
    pub fn imported(&self) -> u64 {
        self.inserted + self.updated
    }

    /// One headline per non-zero category, for the consolidated report
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if self.inserted > 0 {
            lines.push(plural(self.inserted, "record added", "records added"));
        }
        if self.updated > 0 {
            lines.push(plural(
                self.updated,
                "matching record updated",
                "matching records updated",
            ));
        }
        if self.skipped > 0 {
            lines.push(plural(
                self.skipped,
                "duplicate record skipped",
                "duplicate records skipped",
            ));
        }
        if self.errored > 0 {
            lines.push(plural(
                self.errored,
                "record skipped due to errors",
                "records skipped due to errors",
            ));
        }
        if self.imported() == 0 {
            lines.push("Zero records imported".to_string());
        }

        lines
    }
}

fn plural(count: u64, singular: &str, plural: &str) -> String {
    format!("{} {}", count, if count == 1 { singular } else { plural })
}
