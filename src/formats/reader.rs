use serde::{Serialize, Serializer};

use crate::config::{DEFAULT_DELIMITER, DEFAULT_ENCLOSURE};

/// A single row from the file, before column reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line of the file on which the row starts
    pub line: u64,
    pub fields: Vec<String>,
}

/// Field separator and quoting character of a delimited file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub enclosure: u8,
}

impl Dialect {
    pub fn new(delimiter: u8, enclosure: u8) -> Self {
        Self {
            delimiter,
            enclosure,
        }
    }

    /// Infer the dialect of a file from its content
    pub fn sniff(text: &str) -> Self {
        let delimiter = super::dialect::detect_delimiter(text.as_bytes());
        let enclosure = super::dialect::detect_enclosure(text, delimiter);
        Self {
            delimiter,
            enclosure,
        }
    }

    /// Convert delimiter byte to string representation
    pub fn delimiter_as_string(&self) -> String {
        byte_as_string(self.delimiter)
    }

    /// Convert enclosure byte to string representation
    pub fn enclosure_as_string(&self) -> String {
        byte_as_string(self.enclosure)
    }
}

fn byte_as_string(byte: u8) -> String {
    if byte == b'\t' {
        "\\t".to_string()
    } else if byte.is_ascii_graphic() {
        (byte as char).to_string()
    } else {
        format!("\\x{:02x}", byte)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            enclosure: DEFAULT_ENCLOSURE,
        }
    }
}

/// Helper struct for JSON serialization of Dialect
#[derive(Serialize)]
struct DialectJson {
    delimiter: String,
    enclosure: String,
}

impl Serialize for Dialect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        DialectJson {
            delimiter: self.delimiter_as_string(),
            enclosure: self.enclosure_as_string(),
        }
        .serialize(serializer)
    }
}
