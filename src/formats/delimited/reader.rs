use csv::{ByteRecord, Reader, ReaderBuilder};
use tracing::warn;

use crate::formats::reader::{Dialect, RawRow};

/// Recoverable quoting problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub line: u64,
    pub message: String,
}

/// Forward-only row iterator over the text of a delimited file
///
/// Fields may contain the delimiter or line breaks only while enclosed, and a
/// doubled enclosure inside an enclosed field is one literal enclosure. Rows
/// may have differing field counts; validating the width is left to the
/// caller. Malformed quoting never stops iteration: an unterminated enclosure
/// swallows the rest of the file into the current field and a stray one is
/// kept as a literal character. Both are reported as [`ParseDiagnostic`]s.
pub struct RecordParser<'a> {
    reader: Reader<&'a [u8]>,
    source: &'a [u8],
    delimiter: u8,
    enclosure: u8,
    record: ByteRecord,
    /// Bytes of `source` already scanned for line breaks
    scanned: usize,
    /// 1-based line number at `scanned`
    line: u64,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> RecordParser<'a> {
    pub fn new(text: &'a str, dialect: Dialect) -> Self {
        let source = text.as_bytes();
        let reader = ReaderBuilder::new()
            .delimiter(dialect.delimiter)
            .quote(dialect.enclosure)
            .double_quote(true)
            .flexible(true)
            .has_headers(false) // Header detection happens during reconciliation
            .from_reader(source);

        Self {
            reader,
            source,
            delimiter: dialect.delimiter,
            enclosure: dialect.enclosure,
            record: ByteRecord::new(),
            scanned: 0,
            line: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Line number of the row whose raw text begins at or after `offset`
    ///
    /// The reader reports a record's start before the terminator bytes and
    /// blank lines it skips, so those are stepped over first. `\n`, `\r\n`
    /// and a lone `\r` each end one line.
    fn line_at(&mut self, offset: usize) -> u64 {
        let mut start = offset.min(self.source.len());
        while matches!(self.source.get(start), Some(b'\r' | b'\n')) {
            start += 1;
        }

        while self.scanned < start {
            match self.source[self.scanned] {
                b'\n' => self.line += 1,
                b'\r' if self.source.get(self.scanned + 1) != Some(&b'\n') => self.line += 1,
                _ => {}
            }
            self.scanned += 1;
        }
        self.line
    }

    /// Take the diagnostics collected since the last call
    pub fn drain_diagnostics(&mut self) -> std::vec::Drain<'_, ParseDiagnostic> {
        self.diagnostics.drain(..)
    }

    /// Flag rows whose raw text holds an odd number of enclosure characters.
    ///
    /// Well-formed enclosed fields and doubled enclosures always contribute an
    /// even count, so an odd count means an unterminated or stray enclosure.
    fn check_enclosures(&mut self, line: u64, start: usize, end: usize) {
        let raw = &self.source[start.min(end)..end];
        let count = raw.iter().filter(|&&b| b == self.enclosure).count();
        if count % 2 == 0 {
            return;
        }

        let message = if ends_inside_enclosure(raw, self.delimiter, self.enclosure) {
            format!(
                "Unterminated {} enclosure starting on line {}; the rest of the file was read into the last field",
                self.enclosure as char, line
            )
        } else {
            format!(
                "Stray {} enclosure on line {}; it was kept as a literal character",
                self.enclosure as char, line
            )
        };
        warn!("CSV parse problem: {}", message);
        self.diagnostics.push(ParseDiagnostic { line, message });
    }
}

/// Whether the raw text of a row finishes inside an open enclosed field
fn ends_inside_enclosure(raw: &[u8], delimiter: u8, enclosure: u8) -> bool {
    let mut quoted = false;
    let mut field_start = true;
    let mut i = 0;

    while i < raw.len() {
        let b = raw[i];
        if quoted {
            if b == enclosure {
                if raw.get(i + 1) == Some(&enclosure) {
                    i += 1;
                } else {
                    quoted = false;
                }
            }
        } else if field_start && b == enclosure {
            quoted = true;
        }
        field_start = !quoted && (b == delimiter || b == b'\n' || b == b'\r');
        i += 1;
    }

    quoted
}

impl Iterator for RecordParser<'_> {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        let start = self.reader.position().byte() as usize;

        match self.reader.read_byte_record(&mut self.record) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                // Reading from an in-memory slice with flexible widths leaves
                // nothing recoverable to continue from.
                warn!("CSV reader stopped: {}", e);
                return None;
            }
        }

        let record_start = self
            .record
            .position()
            .map(|p| p.byte() as usize)
            .unwrap_or(start);
        let line = self.line_at(record_start);
        let end = self.reader.position().byte() as usize;
        self.check_enclosures(line, start, end);

        let fields = self
            .record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();

        Some(RawRow { line, fields })
    }
}
