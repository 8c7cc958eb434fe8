//! Configuration constants for the importer
//!
//! This module centralizes all tunable parameters and constants used throughout
//! the application.

use std::time::Duration;

// ============================================================================
// Dialect Detection
// ============================================================================

/// Number of leading bytes inspected when counting delimiter candidates
///
/// Large enough to cover a header and a few dozen rows of a typical export,
/// small enough that a long free-text column further down the file cannot
/// skew the counts.
pub const SNIFF_SAMPLE_SIZE: usize = 2000;

/// Delimiter candidates in priority order. Earlier entries win ties.
pub const DELIMITER_CANDIDATES: [u8; 6] = [b',', b';', b'\t', b'.', b':', b'|'];

pub const DEFAULT_DELIMITER: u8 = b',';

/// Characters considered as field enclosures
pub const ENCLOSURE_CANDIDATES: [u8; 2] = [b'"', b'\''];

pub const DEFAULT_ENCLOSURE: u8 = b'"';

// ============================================================================
// Upload Configuration
// ============================================================================

/// The only file extension accepted for import (compared case-insensitively)
pub const ALLOWED_EXTENSION: &str = "csv";

/// Largest upload accepted for import
///
/// The whole file is held in memory while it is parsed, so this is the bound
/// on memory used by a single session.
pub const MAX_IMPORT_BYTES: u64 = 64 * 1024 * 1024; // 64 MB

// ============================================================================
// Database Configuration
// ============================================================================

pub const MAX_CONNECTIONS: u32 = 4;

/// How long to wait for a pooled connection before giving up
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
