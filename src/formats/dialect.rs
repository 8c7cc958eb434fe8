//! Dialect detection heuristics
//!
//! Both detectors are total: an ambiguous file yields the defaults rather than
//! an error. They can be fooled by pathological input, e.g. a file whose
//! content contains more `.` than real separators.

use crate::config::{
    DEFAULT_DELIMITER, DEFAULT_ENCLOSURE, DELIMITER_CANDIDATES, ENCLOSURE_CANDIDATES,
    SNIFF_SAMPLE_SIZE,
};

/// Pick the delimiter by counting candidates in the head of the file
///
/// Only the first [`SNIFF_SAMPLE_SIZE`] bytes are examined. The candidate
/// with the strictly highest count wins. A tie at the top, or no candidate
/// occurring more than once, falls back to the comma.
pub fn detect_delimiter(sample: &[u8]) -> u8 {
    let sample = &sample[..sample.len().min(SNIFF_SAMPLE_SIZE)];

    let mut counts = [0usize; DELIMITER_CANDIDATES.len()];
    for byte in sample {
        if let Some(idx) = DELIMITER_CANDIDATES.iter().position(|c| c == byte) {
            counts[idx] += 1;
        }
    }

    let best = counts.iter().copied().max().unwrap_or(0);
    if best <= 1 {
        return DEFAULT_DELIMITER;
    }

    let mut leaders = DELIMITER_CANDIDATES
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count == best)
        .map(|(candidate, _)| *candidate);

    match (leaders.next(), leaders.next()) {
        (Some(candidate), None) => candidate,
        _ => DEFAULT_DELIMITER,
    }
}

/// Pick the enclosure from the first quoted field that precedes a delimiter
///
/// Looks for the leftmost quote character `q` that is followed by at least
/// one character, then `q` again, then `delimiter`. Falls back to `"`.
pub fn detect_enclosure(text: &str, delimiter: u8) -> u8 {
    let bytes = text.as_bytes();

    // For each quote character, the pattern can start at its first occurrence
    // iff that occurrence lies at least two bytes before the last `q delimiter`
    // pair. Later occurrences can only start later, so the leftmost match over
    // all quote characters is the smallest qualifying first occurrence.
    ENCLOSURE_CANDIDATES
        .iter()
        .filter_map(|&quote| {
            let first = bytes.iter().position(|&b| b == quote)?;
            let last_pair = bytes
                .windows(2)
                .rposition(|pair| pair[0] == quote && pair[1] == delimiter)?;
            (first + 2 <= last_pair).then_some((first, quote))
        })
        .min_by_key(|(first, _)| *first)
        .map(|(_, quote)| quote)
        .unwrap_or(DEFAULT_ENCLOSURE)
}
